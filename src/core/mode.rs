//! Build mode selection for development/production builds.

/// Build mode, fixed once per invocation and passed to every stage.
///
/// Each flag gates one family of work so the two modes stay testable in
/// isolation. Use [`BuildMode::PRODUCTION`] or [`BuildMode::DEVELOPMENT`]
/// rather than building the struct by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Insert content hashes into asset filenames and record a manifest.
    pub revision: bool,

    /// Minify CSS, JS, JSON and HTML output.
    pub minify: bool,

    /// Ask external compilers for source maps.
    pub source_maps: bool,

    /// Recompress images.
    pub optimize_images: bool,

    /// Log per-type output sizes at the end of the build.
    pub report: bool,
}

impl BuildMode {
    /// Production mode: revisioned, minified, compressed, with a size report.
    pub const PRODUCTION: Self = Self {
        revision: true,
        minify: true,
        source_maps: true,
        optimize_images: true,
        report: true,
    };

    /// Development mode: straight copy/compile passes only.
    pub const DEVELOPMENT: Self = Self {
        revision: false,
        minify: false,
        source_maps: false,
        optimize_images: false,
        report: false,
    };

    /// Pick the mode from the `--dev` flag.
    pub const fn from_dev_flag(dev: bool) -> Self {
        if dev {
            Self::DEVELOPMENT
        } else {
            Self::PRODUCTION
        }
    }

    /// Check if this is development mode.
    #[inline]
    pub const fn is_dev(&self) -> bool {
        !self.revision
    }

    /// Name exported to external tools as `$STAMP_MODE`.
    pub const fn as_str(&self) -> &'static str {
        if self.is_dev() {
            "development"
        } else {
            "production"
        }
    }
}
