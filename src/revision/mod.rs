//! Asset revisioning: content hashing, the manifest, and reference rewriting.
//!
//! | Module       | Purpose                                             |
//! |--------------|-----------------------------------------------------|
//! | `hash`       | Fixed-length content fingerprints                   |
//! | `manifest`   | Original → revisioned path mapping, JSON persistence |
//! | `revisioner` | Writes assets under their final name                |
//! | `rewrite`    | Substring rewriting of references in text files     |

pub mod hash;
mod manifest;
mod revisioner;
mod rewrite;

pub use manifest::Manifest;
pub use revisioner::Revisioner;
pub use rewrite::Rewriter;
