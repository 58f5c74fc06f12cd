use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseScheduleError {
    pub kind: &'static str,
    pub value: String,
}

/// Weekly recurrence of a class on the grid scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulePattern {
    #[serde(rename = "Tu/Th")]
    TuTh,
    #[serde(rename = "Tu")]
    Tu,
    #[serde(rename = "Th")]
    Th,
    #[serde(rename = "Wed")]
    Wed,
}

impl SchedulePattern {
    pub const ALL: [SchedulePattern; 4] = [
        SchedulePattern::TuTh,
        SchedulePattern::Tu,
        SchedulePattern::Th,
        SchedulePattern::Wed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulePattern::TuTh => "Tu/Th",
            SchedulePattern::Tu => "Tu",
            SchedulePattern::Th => "Th",
            SchedulePattern::Wed => "Wed",
        }
    }

    /// Concrete weekdays the pattern meets on.
    pub fn weekdays(&self) -> DaySet {
        match self {
            SchedulePattern::TuTh => DaySet::from_days([Weekday::Tue, Weekday::Thu]),
            SchedulePattern::Tu => DaySet::from_days([Weekday::Tue]),
            SchedulePattern::Th => DaySet::from_days([Weekday::Thu]),
            SchedulePattern::Wed => DaySet::from_days([Weekday::Wed]),
        }
    }

    /// Two patterns overlap iff they share a weekday.
    pub fn overlaps(&self, other: &SchedulePattern) -> bool {
        self.weekdays().intersects(&other.weekdays())
    }

    /// Day specification used for event materialization, e.g. `Tuesday/Thursday`.
    pub fn day_spec(&self) -> String {
        self.weekdays().to_spec()
    }
}

impl fmt::Display for SchedulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulePattern {
    type Err = ParseScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchedulePattern::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseScheduleError {
                kind: "schedule pattern",
                value: s.to_string(),
            })
    }
}

/// Named slot of the school-day timetable, in timetable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeBlock {
    #[serde(rename = "Block 1")]
    Block1,
    #[serde(rename = "Block 2")]
    Block2,
    #[serde(rename = "Block 3")]
    Block3,
    #[serde(rename = "Lunch")]
    Lunch,
    #[serde(rename = "Block 4")]
    Block4,
    #[serde(rename = "Block 5")]
    Block5,
}

impl TimeBlock {
    pub const ALL: [TimeBlock; 6] = [
        TimeBlock::Block1,
        TimeBlock::Block2,
        TimeBlock::Block3,
        TimeBlock::Lunch,
        TimeBlock::Block4,
        TimeBlock::Block5,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeBlock::Block1 => "Block 1",
            TimeBlock::Block2 => "Block 2",
            TimeBlock::Block3 => "Block 3",
            TimeBlock::Lunch => "Lunch",
            TimeBlock::Block4 => "Block 4",
            TimeBlock::Block5 => "Block 5",
        }
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeBlock {
    type Err = ParseScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TimeBlock::ALL
            .into_iter()
            .find(|b| b.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseScheduleError {
                kind: "time block",
                value: s.to_string(),
            })
    }
}

pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Unordered set of weekdays, kept as a bitmask indexed from Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Weekday>", into = "Vec<Weekday>")]
pub struct DaySet(u8);

impl DaySet {
    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        days.into_iter().fold(DaySet::default(), |mut set, day| {
            set.insert(day);
            set
        })
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn intersects(&self, other: &DaySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(|d| self.contains(*d))
    }

    /// Full weekday names joined with `/`, Monday first.
    pub fn to_spec(&self) -> String {
        self.iter().map(weekday_name).collect::<Vec<_>>().join("/")
    }

    /// Lenient parse of a stored day list such as `Tuesday,Thursday` or `tue/thu`.
    pub fn parse_list(raw: &str) -> Self {
        DaySet::from_days(
            raw.split([',', '/', ' '])
                .filter(|part| !part.is_empty())
                .filter_map(|part| part.trim().parse::<Weekday>().ok()),
        )
    }
}

impl From<Vec<Weekday>> for DaySet {
    fn from(days: Vec<Weekday>) -> Self {
        DaySet::from_days(days)
    }
}

impl From<DaySet> for Vec<Weekday> {
    fn from(set: DaySet) -> Self {
        set.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_matrix() {
        use SchedulePattern::*;
        let expected = [
            (TuTh, TuTh, true),
            (TuTh, Tu, true),
            (TuTh, Th, true),
            (TuTh, Wed, false),
            (Tu, Tu, true),
            (Tu, Th, false),
            (Tu, Wed, false),
            (Th, Th, true),
            (Th, Wed, false),
            (Wed, Wed, true),
        ];
        for (a, b, overlap) in expected {
            assert_eq!(a.overlaps(&b), overlap, "{} vs {}", a, b);
            assert_eq!(b.overlaps(&a), overlap, "{} vs {}", b, a);
        }
    }

    #[test]
    fn test_pattern_and_block_parse() {
        assert_eq!("tu/th".parse::<SchedulePattern>(), Ok(SchedulePattern::TuTh));
        assert_eq!("Wed".parse::<SchedulePattern>(), Ok(SchedulePattern::Wed));
        assert!("Fri".parse::<SchedulePattern>().is_err());
        assert_eq!("block 2".parse::<TimeBlock>(), Ok(TimeBlock::Block2));
        assert_eq!("Lunch".parse::<TimeBlock>(), Ok(TimeBlock::Lunch));
        assert!(TimeBlock::Block3 < TimeBlock::Lunch);
        assert!(TimeBlock::Lunch < TimeBlock::Block4);
    }

    #[test]
    fn test_day_set() {
        let set = DaySet::parse_list("Thursday,tue");
        assert!(set.contains(Weekday::Tue));
        assert!(set.contains(Weekday::Thu));
        assert!(!set.contains(Weekday::Wed));
        assert_eq!(set.to_spec(), "Tuesday/Thursday");
        assert_eq!(SchedulePattern::TuTh.day_spec(), "Tuesday/Thursday");
        assert!(DaySet::parse_list("").is_empty());
    }
}
