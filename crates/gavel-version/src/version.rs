//! Maven version parsing and ordering

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 1.0-20090401.120000-3
    static ref TIMESTAMP_SNAPSHOT_RE: Regex =
        Regex::new(r"^(.*)-(\d{8}\.\d{6})-(\d+)$").unwrap();
}

/// Suffix of a non-timestamped snapshot version
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Well-known qualifiers, lowest first. The empty qualifier is a release.
const QUALIFIERS: [&str; 7] = ["alpha", "beta", "milestone", "rc", "snapshot", "", "sp"];

/// A single component of a parsed version.
#[derive(Debug, Clone)]
enum Item {
    /// Digits with leading zeros stripped ("0" for zero)
    Int(String),
    /// Qualifier, already lowercased and de-aliased
    Str(String),
    /// Sub-list started by `-` or a digit/letter transition
    List(Vec<Item>),
}

impl Item {
    fn is_null(&self) -> bool {
        match self {
            Item::Int(digits) => digits == "0",
            Item::Str(qualifier) => qualifier.is_empty(),
            Item::List(items) => items.is_empty(),
        }
    }

    /// Compare against a missing item on the other side.
    fn compare_to_null(&self) -> Ordering {
        match self {
            Item::Int(digits) => {
                if digits == "0" {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            Item::Str(qualifier) => qualifier_key(qualifier).cmp(&qualifier_key("")),
            Item::List(items) => items.first().map_or(Ordering::Equal, Item::compare_to_null),
        }
    }
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(x), None) => x.compare_to_null(),
        (None, Some(y)) => y.compare_to_null().reverse(),
        (Some(Item::Int(x)), Some(Item::Int(y))) => compare_digits(x, y),
        (Some(Item::Int(_)), Some(_)) => Ordering::Greater,
        (Some(Item::Str(_)), Some(Item::Int(_))) => Ordering::Less,
        (Some(Item::Str(x)), Some(Item::Str(y))) => qualifier_key(x).cmp(&qualifier_key(y)),
        (Some(Item::Str(_)), Some(Item::List(_))) => Ordering::Less,
        (Some(Item::List(_)), Some(Item::Int(_))) => Ordering::Less,
        (Some(Item::List(_)), Some(Item::Str(_))) => Ordering::Greater,
        (Some(Item::List(x)), Some(Item::List(y))) => compare_lists(x, y),
    }
}

fn compare_lists(a: &[Item], b: &[Item]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        match compare_items(a.get(i), b.get(i)) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Numeric comparison of arbitrary-length digit strings without leading zeros.
fn compare_digits(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort key of a qualifier: known qualifiers by index, unknown ones after
/// all known ones, lexically among themselves.
fn qualifier_key(qualifier: &str) -> String {
    match QUALIFIERS.iter().position(|q| *q == qualifier) {
        Some(index) => index.to_string(),
        None => format!("{}-{}", QUALIFIERS.len(), qualifier),
    }
}

fn normalize_qualifier(value: &str, followed_by_digit: bool) -> String {
    if followed_by_digit && value.len() == 1 {
        match value {
            "a" => return "alpha".to_string(),
            "b" => return "beta".to_string(),
            "m" => return "milestone".to_string(),
            _ => {}
        }
    }
    match value {
        "ga" | "final" | "release" => String::new(),
        "cr" => "rc".to_string(),
        other => other.to_string(),
    }
}

fn parse_item(is_digit: bool, text: &str) -> Item {
    if is_digit {
        let trimmed = text.trim_start_matches('0');
        Item::Int(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
    } else {
        Item::Str(normalize_qualifier(text, false))
    }
}

/// Parse arena: lists reference each other by index until the final tree is assembled.
enum RawItem {
    Leaf(Item),
    List(usize),
}

struct ItemArena {
    lists: Vec<Vec<RawItem>>,
    stack: Vec<usize>,
    current: usize,
}

impl ItemArena {
    fn new() -> Self {
        Self { lists: vec![Vec::new()], stack: vec![0], current: 0 }
    }

    fn push(&mut self, item: Item) {
        self.lists[self.current].push(RawItem::Leaf(item));
    }

    fn open_list(&mut self) {
        let index = self.lists.len();
        self.lists.push(Vec::new());
        self.lists[self.current].push(RawItem::List(index));
        self.stack.push(index);
        self.current = index;
    }

    fn is_null(&self, item: &RawItem) -> bool {
        match item {
            RawItem::Leaf(leaf) => leaf.is_null(),
            RawItem::List(index) => self.lists[*index].is_empty(),
        }
    }

    /// Remove trailing null items, stopping at the first non-null leaf.
    fn normalize(&mut self, index: usize) {
        let mut i = self.lists[index].len();
        while i > 0 {
            i -= 1;
            let item = &self.lists[index][i];
            let null = self.is_null(item);
            let list = matches!(item, RawItem::List(_));
            if null {
                self.lists[index].remove(i);
            } else if !list {
                break;
            }
        }
    }

    fn finish(mut self) -> Vec<Item> {
        while let Some(index) = self.stack.pop() {
            self.normalize(index);
        }
        let mut lists: Vec<Option<Vec<RawItem>>> = self.lists.into_iter().map(Some).collect();
        assemble(&mut lists, 0)
    }
}

fn assemble(lists: &mut [Option<Vec<RawItem>>], index: usize) -> Vec<Item> {
    let raw = lists[index].take().unwrap_or_default();
    raw.into_iter()
        .map(|item| match item {
            RawItem::Leaf(leaf) => leaf,
            RawItem::List(child) => Item::List(assemble(lists, child)),
        })
        .collect()
}

fn parse_items(version: &str) -> Vec<Item> {
    let version = version.to_lowercase();
    let chars: Vec<char> = version.chars().collect();
    let mut arena = ItemArena::new();
    let mut is_digit = false;
    let mut start = 0;

    let text = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

    for (i, &c) in chars.iter().enumerate() {
        if c == '.' {
            if i == start {
                arena.push(Item::Int("0".to_string()));
            } else {
                arena.push(parse_item(is_digit, &text(start, i)));
            }
            start = i + 1;
        } else if c == '-' {
            if i == start {
                arena.push(Item::Int("0".to_string()));
            } else {
                arena.push(parse_item(is_digit, &text(start, i)));
            }
            start = i + 1;
            arena.open_list();
        } else if c.is_ascii_digit() {
            if !is_digit && i > start {
                // 1.0.0.x1 < 1.0.0-x2: a dotted qualifier behaves like a dashed one
                if !arena.lists[arena.current].is_empty() {
                    arena.open_list();
                }
                arena.push(Item::Str(normalize_qualifier(&text(start, i), true)));
                start = i;
                arena.open_list();
            }
            is_digit = true;
        } else {
            if is_digit && i > start {
                arena.push(parse_item(true, &text(start, i)));
                start = i;
                arena.open_list();
            }
            is_digit = false;
        }
    }

    if chars.len() > start {
        arena.push(parse_item(is_digit, &text(start, chars.len())));
    }

    arena.finish()
}

fn write_items(items: &[Item], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(if matches!(item, Item::List(_)) { '-' } else { '.' });
        }
        match item {
            Item::Int(digits) => out.push_str(digits),
            Item::Str(qualifier) => out.push_str(qualifier),
            Item::List(sub) => write_items(sub, out),
        }
    }
}

/// A Maven artifact version.
///
/// Parsing never fails: any string is a version, ordered with Maven's rules
/// (`1.0-alpha-1 < 1.0-beta < 1.0-rc1 < 1.0-SNAPSHOT < 1.0 < 1.0-sp1 < 1.0.1`).
/// Equality and hashing follow the ordering, so `1`, `1.0` and `1.0.0` are equal.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    items: Vec<Item>,
}

impl Version {
    /// Parse a version string
    pub fn parse(version: &str) -> Self {
        let raw = version.trim().to_string();
        let items = parse_items(&raw);
        Self { raw, items }
    }

    /// The version exactly as it was written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Normalized form used for equality and hashing
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        write_items(&self.items, &mut out);
        out
    }

    /// Check whether this is a `-SNAPSHOT` or a timestamped snapshot version
    pub fn is_snapshot(&self) -> bool {
        self.raw.ends_with(SNAPSHOT_SUFFIX) || TIMESTAMP_SNAPSHOT_RE.is_match(&self.raw)
    }

    /// Check whether this version is a release (not a snapshot)
    pub fn is_release(&self) -> bool {
        !self.is_snapshot()
    }

    /// Base version of a timestamped snapshot (`1.0-20090401.120000-3` becomes `1.0-SNAPSHOT`)
    pub fn base_version(&self) -> String {
        match TIMESTAMP_SNAPSHOT_RE.captures(&self.raw) {
            Some(caps) => format!("{}{}", &caps[1], SNAPSHOT_SUFFIX),
            None => self.raw.clone(),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_lists(&self.items, &other.items)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Version {
    fn from(version: &str) -> Self {
        Version::parse(version)
    }
}

impl std::str::FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Version::parse(s))
    }
}
