pub mod scenario;
pub mod util;

pub use util::{default_save_base, parse_seeds, run_dir, split_csv};
