use std::path::PathBuf;

use anyhow::Context;
use csdense::sizer;

/// Print a compiled object's `.text` section size to stdout. Exists so the
/// interestingness predicate script and the Sizer never disagree about how
/// a `size` report is parsed — both go through
/// `csdense::sizer::text_section_size`.
#[derive(Debug, clap::Parser)]
pub struct InternalTextSize {
    object: PathBuf,
}

impl InternalTextSize {
    pub fn run(self) -> anyhow::Result<()> {
        let size = sizer::text_section_size(&self.object)
            .with_context(|| format!("Reading text section size of {}", self.object.display()))?;
        println!("{size}");
        Ok(())
    }
}
