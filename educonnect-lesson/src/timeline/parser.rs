//! Timeline text parser
//!
//! Line grammar (after trimming, blank lines ignored):
//!
//! ```text
//! ## Section header                      skipped
//! [00:02] - [00:39] : **Intro**          starts a marker at 00:02 labelled "Intro"
//! > welcome text                         description of the open marker
//! Some plain line                        label, if the open marker has none yet
//! ```
//!
//! Parsing is a fold over classified lines with one draft marker in
//! progress. A draft is emitted when the next time range arrives (if it has
//! a label) and at end of input (if it has both label and start time).
//! Malformed input only ever yields fewer markers.

use super::TimelineMarker;
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([0-9]{2}:[0-9]{2}(?::[0-9]{2})?)\]\s*-\s*\[([0-9]{2}:[0-9]{2}(?::[0-9]{2})?)\]")
        .expect("time range pattern is a valid regex")
});

static RANGE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\]\s*:\s*(.+)$").expect("label pattern is a valid regex")
});

/// One classified input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    /// `#`-prefixed section header
    Header,
    /// `[start] - [end] : label`; the end time only closes the previous block
    TimeRange { start: &'a str, label: Option<&'a str> },
    /// `>`-prefixed description text (prefix and whitespace removed)
    Description(&'a str),
    /// Anything else
    Plain(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.starts_with('#') {
        return Line::Header;
    }
    if let Some(range) = TIME_RANGE.captures(line) {
        let start = range.get(1).map_or("", |m| m.as_str());
        let label = RANGE_LABEL
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|label| !label.is_empty());
        return Line::TimeRange { start, label };
    }
    if let Some(rest) = line.strip_prefix('>') {
        return Line::Description(rest.trim());
    }
    Line::Plain(line)
}

/// Marker being accumulated
#[derive(Debug, Default)]
struct Draft {
    start: String,
    label: String,
    desc: String,
}

impl Draft {
    fn into_marker(self) -> TimelineMarker {
        TimelineMarker {
            seconds: time_string_to_seconds(&self.start),
            time: self.start,
            label: clean_markdown(&self.label),
            desc: clean_markdown(&self.desc),
        }
    }
}

#[derive(Debug)]
enum State {
    /// Nothing collected yet
    NoMarkerOpen,
    /// A draft exists, possibly without a start time (implicit marker)
    MarkerOpen(Draft),
}

struct Fold {
    markers: Vec<TimelineMarker>,
    state: State,
}

impl Fold {
    fn new() -> Self {
        Self {
            markers: Vec::new(),
            state: State::NoMarkerOpen,
        }
    }

    fn draft(&mut self) -> &mut Draft {
        if let State::NoMarkerOpen = self.state {
            self.state = State::MarkerOpen(Draft::default());
        }
        match &mut self.state {
            State::MarkerOpen(draft) => draft,
            State::NoMarkerOpen => unreachable!("draft opened above"),
        }
    }

    fn step(mut self, line: Line<'_>) -> Self {
        match line {
            Line::Header => {}
            Line::TimeRange { start, label } => {
                if let State::MarkerOpen(previous) =
                    std::mem::replace(&mut self.state, State::NoMarkerOpen)
                {
                    if !previous.label.is_empty() {
                        self.markers.push(previous.into_marker());
                    }
                }
                self.state = State::MarkerOpen(Draft {
                    start: start.to_string(),
                    label: label.unwrap_or_default().to_string(),
                    desc: String::new(),
                });
            }
            Line::Description(text) => {
                if !text.is_empty() {
                    self.draft().desc = text.to_string();
                }
            }
            Line::Plain(text) => {
                let draft = self.draft();
                if draft.label.is_empty() {
                    draft.label = text.to_string();
                }
            }
        }
        self
    }

    fn finish(mut self) -> Vec<TimelineMarker> {
        if let State::MarkerOpen(last) = self.state {
            if !last.label.is_empty() && !last.start.is_empty() {
                self.markers.push(last.into_marker());
            }
        }
        self.markers
    }
}

/// Parse timeline text into markers, in order of appearance
pub fn parse_timeline_text(text: &str) -> Vec<TimelineMarker> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(classify)
        .fold(Fold::new(), Fold::step)
        .finish()
}

/// Convert `MM:SS` or `HH:MM:SS` to seconds
///
/// Any other number of components yields 0, as does a component that is not
/// a non-negative integer.
pub fn time_string_to_seconds(time: &str) -> u64 {
    let parts: Vec<u64> = time
        .split(':')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect();

    match parts.as_slice() {
        [minutes, seconds] => minutes.saturating_mul(60).saturating_add(*seconds),
        [hours, minutes, seconds] => hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(*seconds),
        _ => 0,
    }
}

/// Remove `**` bold markers and surrounding whitespace
pub fn clean_markdown(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}
