//! Configuration section definitions.
//!
//! Each module corresponds to a section in `stamp.toml`:
//!
//! | Module    | TOML Section              | Purpose                         |
//! |-----------|---------------------------|---------------------------------|
//! | `build`   | `[build]`                 | Source/dest trees, manifest     |
//! | `styles`  | `[styles]`                | Style compiler                  |
//! | `scripts` | `[scripts]`               | Script bundler                  |
//! | `json`    | `[json]`                  | JSON data files                 |
//! | `images`  | `[images]`                | Image copy/optimization         |
//! | `html`    | `[html]`, `[critical]`    | HTML pages, critical CSS        |
//! | `output`  | `[rewrite]`, `[report]`   | Reference rewriting, size report |

pub mod build;
mod html;
mod images;
mod json;
mod output;
mod scripts;
mod styles;
mod tool;

pub use build::BuildConfig;
pub use html::{CriticalConfig, HtmlConfig};
pub use images::ImagesConfig;
pub use json::JsonConfig;
pub use output::{ReportConfig, RewriteConfig};
pub use scripts::ScriptsConfig;
pub use styles::StylesConfig;
