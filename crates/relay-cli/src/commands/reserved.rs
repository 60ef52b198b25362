//! `relay reserved`: list the receiver names that are qualified with `self.`

use relay_engine::ReservedNames;

use crate::output::{resolve_color_choice, StyledOutput};

/// Print the default reserved names plus `extra`, one per line
pub fn execute(extra: &[String], color: Option<&str>) -> anyhow::Result<()> {
    let reserved = words(extra);
    let mut out = StyledOutput::new(resolve_color_choice(color));
    for word in &reserved {
        out.plain(word);
        out.dim(&format!("  -> self.{}", word));
        out.newline();
    }
    out.flush();
    Ok(())
}

/// Sorted reserved names, including `extra`
pub fn words(extra: &[String]) -> Vec<String> {
    extra
        .iter()
        .fold(ReservedNames::default(), |set, word| set.with_word(word.clone()))
        .words()
        .into_iter()
        .map(String::from)
        .collect()
}
