//! Paths exempt from authentication ("permit all").
//!
//! Patterns use ant-style syntax:
//! - `?`  one character within a segment
//! - `*`  any run of characters within a segment
//! - `**` any number of whole segments, including none
//!
//! `/public/**` therefore covers `/public` and everything below it, while a
//! literal pattern such as `/health` matches that exact path only.
//!
//! A path with `.` or `..` segments (plain or `%2e`-encoded) never matches:
//! downstream servers resolve them, so `/public/../api` is not public.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    AnyDepth,
    Glob(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = split_segments(pattern)
            .map(|s| {
                if s == "**" {
                    Segment::AnyDepth
                } else {
                    Segment::Glob(s.to_string())
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_segments(path).collect();
        match_segments(&self.segments, &parts)
    }
}

fn split_segments(s: &str) -> impl Iterator<Item = &str> {
    s.split('/').filter(|seg| !seg.is_empty())
}

// `reachable[j]`: the pattern prefix seen so far can consume exactly `path[..j]`.
// One pass per pattern segment keeps the cost at O(pattern * path).
fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    let mut reachable = vec![false; path.len() + 1];
    reachable[0] = true;

    for segment in pattern {
        let mut next = vec![false; path.len() + 1];
        match segment {
            Segment::AnyDepth => {
                let mut seen = false;
                for (j, slot) in next.iter_mut().enumerate() {
                    seen |= reachable[j];
                    *slot = seen;
                }
            }
            Segment::Glob(glob) => {
                for (j, part) in path.iter().enumerate() {
                    if reachable[j] && glob_matches(glob, part) {
                        next[j + 1] = true;
                    }
                }
            }
        }
        reachable = next;
    }

    reachable[path.len()]
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

// Single-segment wildcard match with backtracking on the last `*`.
fn glob_matches(glob: &str, text: &str) -> bool {
    let glob: Vec<char> = glob.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut g, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if g < glob.len() && (glob[g] == '?' || glob[g] == text[t]) {
            g += 1;
            t += 1;
        } else if g < glob.len() && glob[g] == '*' {
            star = Some((g, t));
            g += 1;
        } else if let Some((star_g, star_t)) = star {
            g = star_g + 1;
            t = star_t + 1;
            star = Some((star_g, star_t + 1));
        } else {
            return false;
        }
    }

    glob[g..].iter().all(|c| *c == '*')
}

/// Ordered allow-list; the first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    patterns: Vec<PathPattern>,
}

impl AllowList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| PathPattern::new(&p))
            .collect();

        Self { patterns }
    }

    /// The first pattern matching `path`, if any.
    pub fn find(&self, path: &str) -> Option<&PathPattern> {
        if split_segments(path).any(is_dot_segment) {
            return None;
        }
        self.patterns.iter().find(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}
