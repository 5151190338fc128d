/// Licenses accepted without comment. Not exhaustive.
pub const KNOWN_LICENSES: &[&str] = &[
    "Allegro 4 Giftware",
    "BSD",
    "BSD3",
    "CC0",
    "GPL",
    "GPLv2",
    "GPLv3",
    "LGPLv2",
    "LGPLv3",
    "MIT",
    "MS-PL",
    "WTFPL",
    "libpng",
    "zlib",
];

pub fn is_known_license(license: &str) -> bool {
    KNOWN_LICENSES.contains(&license)
}
