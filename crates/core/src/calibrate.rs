//! Reading-level calibration and the system instructions derived from it.
//!
//! The reading level controls only the system instruction text handed to
//! the generator; chunking and reconciliation are independent of it. The
//! calibration walk shows graded sample passages and maps the reader's
//! comfort scores onto a level; the CLI drives it interactively.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Target simplification intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    /// Keep sophisticated language, clarify specialist terms.
    Light,
    /// Clear everyday language that keeps the detail.
    #[default]
    Everyday,
    /// Simple, friendly words and short sentences.
    Simple,
    /// The simplest, clearest words possible.
    Simplest,
}

impl ReadingLevel {
    /// Numeric form, 1 (lightest) through 4 (strongest).
    pub fn as_score(&self) -> u8 {
        match self {
            ReadingLevel::Light => 1,
            ReadingLevel::Everyday => 2,
            ReadingLevel::Simple => 3,
            ReadingLevel::Simplest => 4,
        }
    }

    /// Parse the numeric form; values outside 1-4 are rejected.
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            1 => Some(ReadingLevel::Light),
            2 => Some(ReadingLevel::Everyday),
            3 => Some(ReadingLevel::Simple),
            4 => Some(ReadingLevel::Simplest),
            _ => None,
        }
    }

    /// The system instruction for this level.
    ///
    /// The blank-line contract matters: reconciliation splits the output on
    /// blank lines to map units back onto the original paragraphs.
    pub fn system_instruction(&self) -> String {
        let style = match self {
            ReadingLevel::Light => {
                "Keep sophisticated vocabulary where it carries meaning, add brief context for \
                 specialist terms, and improve clarity without dropping detail."
            }
            ReadingLevel::Everyday => {
                "Use clear everyday language that keeps the detail. Break complex ideas into \
                 simpler parts and make sentences shorter."
            }
            ReadingLevel::Simple => {
                "Use simple, friendly words. Break long sentences into short ones and explain \
                 tricky ideas in plain terms."
            }
            ReadingLevel::Simplest => {
                "Use the simplest, clearest words possible. Keep every sentence short and \
                 explain everything as if talking to a friend."
            }
        };

        format!(
            "You rewrite article text so it is easier to read. Keep the meaning and the order of \
             ideas. Return exactly one rewritten paragraph for each input paragraph, separated by \
             a blank line. Do not add headings, introductions, or commentary. {}",
            style
        )
    }
}

/// One calibration set: the same passage written at four reading levels,
/// hardest first.
pub struct GuideSet {
    /// Topic of the set.
    pub name: &'static str,
    /// The passage at levels 1 through 4.
    pub levels: [&'static str; 4],
}

/// The calibration passages.
pub const GUIDE_SETS: &[GuideSet] = &[
    GuideSet {
        name: "Learning and Memory",
        levels: [
            "The consolidation of episodic memory during sleep exemplifies the brain's capacity to \
             reorganize neural representations, selectively strengthening salient associations while \
             attenuating incidental detail accumulated throughout waking experience.",
            "While we sleep, the brain sorts through the day's memories, strengthening the important \
             connections and letting unimportant details fade away.",
            "Sleep helps the brain organize memories. It keeps the important ones strong and lets the \
             small details fade.",
            "Your brain sorts memories while you sleep. It keeps the big things and drops the little \
             things.",
        ],
    },
    GuideSet {
        name: "Cities and Green Space",
        levels: [
            "The incorporation of vegetated corridors into dense urban fabric has demonstrably \
             ameliorated thermal extremes and particulate burdens while concurrently fostering \
             communal cohesion among heterogeneous residential populations.",
            "Adding strips of parkland to crowded cities has been shown to reduce heat and air \
             pollution while also bringing together people from different neighborhoods.",
            "Parks and green paths in cities lower the heat, clean the air, and help neighbors get \
             to know each other.",
            "Green spaces make cities cooler and cleaner. They also help people meet their \
             neighbors.",
        ],
    },
];

/// The interactive calibration walk.
///
/// For each guide set, the reader either accepts the shown passage as
/// comfortable or asks for an easier one; the accepted level per set is
/// recorded and the average maps onto a [`ReadingLevel`].
#[derive(Debug, Default)]
pub struct Calibration {
    set_index: usize,
    level_index: usize,
    scores: Vec<u8>,
}

impl Calibration {
    /// Start a fresh walk.
    pub fn new() -> Self {
        Self::default()
    }

    /// The passage currently on display, or `None` once the walk is done.
    pub fn current_passage(&self) -> Option<&'static str> {
        GUIDE_SETS.get(self.set_index).map(|set| set.levels[self.level_index])
    }

    /// Name of the current guide set, or `None` once the walk is done.
    pub fn current_set(&self) -> Option<&'static str> {
        GUIDE_SETS.get(self.set_index).map(|set| set.name)
    }

    /// The reader is comfortable with the current passage.
    pub fn comfortable(&mut self) {
        if self.is_complete() {
            return;
        }
        self.scores.push(self.level_index as u8 + 1);
        self.set_index += 1;
        self.level_index = 0;
    }

    /// The reader wants an easier passage.
    pub fn prefer_easier(&mut self) {
        if self.is_complete() {
            return;
        }
        if self.level_index < 3 {
            self.level_index += 1;
        } else {
            // Nothing easier left in this set; record the easiest level.
            self.scores.push(4);
            self.set_index += 1;
            self.level_index = 0;
        }
    }

    /// Whether every guide set has been scored.
    pub fn is_complete(&self) -> bool {
        self.set_index >= GUIDE_SETS.len()
    }

    /// The calibrated level, once the walk is complete.
    pub fn result(&self) -> Option<ReadingLevel> {
        if !self.is_complete() || self.scores.is_empty() {
            return None;
        }
        let sum: u32 = self.scores.iter().map(|s| *s as u32).sum();
        let average = sum as f64 / self.scores.len() as f64;
        Some(level_from_average(average))
    }
}

/// Map an average comfort score onto a reading level.
pub fn level_from_average(average: f64) -> ReadingLevel {
    if average <= 1.75 {
        ReadingLevel::Light
    } else if average <= 2.5 {
        ReadingLevel::Everyday
    } else if average <= 3.25 {
        ReadingLevel::Simple
    } else {
        ReadingLevel::Simplest
    }
}

/// The persisted reader profile: the calibrated level and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderProfile {
    /// Calibrated reading level.
    pub reading_level: ReadingLevel,
}

/// Default profile location under the user's config directory.
pub fn profile_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lenio").join("profile.json"))
}

/// Load a profile from the given path, `None` if absent or unreadable.
pub fn load_profile_from(path: &Path) -> Option<ReaderProfile> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save a profile to the given path, creating parent directories.
pub fn save_profile_to(path: &Path, profile: &ReaderProfile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(profile).map_err(std::io::Error::other)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_comfortable_on_first_passages() {
        let mut walk = Calibration::new();
        walk.comfortable();
        walk.comfortable();

        assert!(walk.is_complete());
        assert_eq!(walk.result(), Some(ReadingLevel::Light));
    }

    #[test]
    fn test_always_prefer_easier_lands_on_simplest() {
        let mut walk = Calibration::new();
        while !walk.is_complete() {
            walk.prefer_easier();
        }

        assert_eq!(walk.result(), Some(ReadingLevel::Simplest));
    }

    #[test]
    fn test_mixed_walk_averages() {
        let mut walk = Calibration::new();
        // First set: two steps easier, accept level 3.
        walk.prefer_easier();
        walk.prefer_easier();
        walk.comfortable();
        // Second set: accept level 1.
        walk.comfortable();

        // Average of 3 and 1 is 2.0 -> Everyday.
        assert_eq!(walk.result(), Some(ReadingLevel::Everyday));
    }

    #[rstest]
    #[case(1.0, ReadingLevel::Light)]
    #[case(1.75, ReadingLevel::Light)]
    #[case(2.0, ReadingLevel::Everyday)]
    #[case(2.5, ReadingLevel::Everyday)]
    #[case(3.0, ReadingLevel::Simple)]
    #[case(3.25, ReadingLevel::Simple)]
    #[case(3.5, ReadingLevel::Simplest)]
    #[case(4.0, ReadingLevel::Simplest)]
    fn test_level_from_average(#[case] average: f64, #[case] expected: ReadingLevel) {
        assert_eq!(level_from_average(average), expected);
    }

    #[test]
    fn test_result_unavailable_mid_walk() {
        let mut walk = Calibration::new();
        walk.prefer_easier();
        assert!(walk.result().is_none());
        assert!(walk.current_passage().is_some());
    }

    #[test]
    fn test_instruction_mentions_blank_line_contract() {
        for score in 1..=4 {
            let level = ReadingLevel::from_score(score).unwrap();
            assert!(level.system_instruction().contains("blank line"));
        }
    }

    #[test]
    fn test_profile_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");

        let profile = ReaderProfile { reading_level: ReadingLevel::Simple };
        save_profile_to(&path, &profile).unwrap();

        let loaded = load_profile_from(&path).unwrap();
        assert_eq!(loaded.reading_level, ReadingLevel::Simple);
    }

    #[test]
    fn test_score_round_trip() {
        for score in 1..=4 {
            assert_eq!(ReadingLevel::from_score(score).unwrap().as_score(), score);
        }
        assert!(ReadingLevel::from_score(0).is_none());
        assert!(ReadingLevel::from_score(5).is_none());
    }
}
