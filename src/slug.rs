//! Label slugs
//!
//! Converts the free-text row labels on the source page into stable ASCII
//! keys. The source writes labels in Vietnamese with inconsistent spacing and
//! punctuation, so matching on raw labels breaks whenever the page is
//! reworded; slugs absorb that churn.

/// Vietnamese diacritic groups, each folded to its bare base letter.
///
/// The table is spelled out instead of using Unicode decomposition so the
/// mapping is exactly the one the slug keys were minted with. `đ` does not
/// decompose to `d` under NFD, which is why a generic normalizer is not
/// enough here.
const DIACRITIC_GROUPS: &[(&str, char)] = &[
    ("àáạảãâầấậẩẫăằắặẳẵ", 'a'),
    ("èéẹẻẽêềếệểễ", 'e'),
    ("ìíịỉĩ", 'i'),
    ("òóọỏõôồốộổỗơờớợởỡ", 'o'),
    ("ùúụủũưừứựửữ", 'u'),
    ("ỳýỵỷỹ", 'y'),
    ("đ", 'd'),
];

fn fold_diacritic(c: char) -> char {
    for (group, base) in DIACRITIC_GROUPS {
        if group.contains(c) {
            return *base;
        }
    }
    c
}

/// Canonical slug for a source row label.
///
/// Lowercases, folds Vietnamese diacritics to bare Latin letters, then
/// replaces every remaining non-`[a-z0-9]` character with `_`. The output is
/// always ASCII and the function is idempotent, so a slug fed back in comes
/// out unchanged ("Nhẫn ép vỉ KNP 9999" becomes "nhan_ep_vi_knp_9999").
pub fn slugify(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(fold_diacritic)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
