//! # dupe-scan CLI
//!
//! Command-line interface for the duplicate finder.
//!
//! ## Usage
//! ```bash
//! dupe-scan scan a.jpg b.jpg c.png --threshold 8
//! find ~/Photos -type f | dupe-scan scan - --output json
//! ```

mod cli;

use duplicate_finder::Result;

fn main() -> Result<()> {
    cli::run()
}
