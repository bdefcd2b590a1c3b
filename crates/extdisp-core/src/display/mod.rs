//! Pure helpers for the display state reader: EDID manufacturer decoding and
//! mode list normalisation.  File access lives in `extdisp-app`.

pub mod edid;
pub mod modes;

pub use edid::manufacturer_id;
pub use modes::{dedup_modes, parse_resolution};
