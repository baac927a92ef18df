//! Section name whitelist.

/// Keep a Changelog section names in their conventional order.
pub const CANONICAL_SECTIONS: [&str; 6] = [
    "Added",
    "Changed",
    "Deprecated",
    "Removed",
    "Fixed",
    "Security",
];

/// Section names a fragment source accepts.
///
/// Matching is case-insensitive and accepted names are returned capitalized,
/// so `FIXED`, `fixed` and `Fixed` all become `Fixed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSet {
    names: Vec<String>,
}

impl SectionSet {
    /// Creates a whitelist from arbitrary names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self { names: Vec::new() };
        for name in names {
            let name = capitalize(name.as_ref().trim());
            if !name.is_empty() && !set.names.contains(&name) {
                set.names.push(name);
            }
        }
        set
    }

    /// The six Keep a Changelog sections.
    pub fn canonical() -> Self {
        Self::new(CANONICAL_SECTIONS)
    }

    /// Returns the capitalized section name when `name` is accepted.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let candidate = capitalize(name.trim());
        self.names.contains(&candidate).then_some(candidate)
    }

    /// Whether `name` is accepted.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Accepted names, capitalized, in configuration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for SectionSet {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Uppercases the first character and lowercases the rest.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Sort key placing canonical sections first, in conventional order, and
/// everything else after them alphabetically.
pub fn display_rank(name: &str) -> (usize, String) {
    let rank = CANONICAL_SECTIONS
        .iter()
        .position(|canonical| canonical.eq_ignore_ascii_case(name))
        .unwrap_or(CANONICAL_SECTIONS.len());
    (rank, name.to_string())
}
