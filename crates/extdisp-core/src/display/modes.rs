//! Mode list helpers.

/// Trims and de-duplicates mode strings, keeping the first occurrence of
/// each.  Blank lines are dropped.
///
/// The kernel lists one line per timing, so the same resolution shows up
/// several times at different refresh rates.
pub fn dedup_modes<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut modes: Vec<String> = Vec::new();
    for line in lines {
        let mode = line.trim();
        if mode.is_empty() || modes.iter().any(|m| m == mode) {
            continue;
        }
        modes.push(mode.to_string());
    }
    modes
}

/// Parses a `WxH` mode string into its dimensions.
pub fn parse_resolution(mode: &str) -> Option<(u32, u32)> {
    let (w, h) = mode.trim().split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}
