/// Wizard steps, numbered as they are persisted in drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Reminder = 0,
    Intro = 1,
    Agency = 2,
    Topic = 3,
    Source = 4,
    Details = 5,
    Review = 6,
    View = 7,
}

impl Step {
    pub const FIRST_EDITABLE: Step = Step::Agency;
    pub const LAST_EDITABLE: Step = Step::Review;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: i64) -> Option<Step> {
        let step = match n {
            0 => Self::Reminder,
            1 => Self::Intro,
            2 => Self::Agency,
            3 => Self::Topic,
            4 => Self::Source,
            5 => Self::Details,
            6 => Self::Review,
            7 => Self::View,
            _ => return None,
        };
        Some(step)
    }

    /// Map any saved step number into the editable range 2..=6.
    pub fn clamp_editable(n: i64) -> Step {
        let clamped = n.clamp(
            Self::FIRST_EDITABLE.number() as i64,
            Self::LAST_EDITABLE.number() as i64,
        );
        Self::from_number(clamped).unwrap_or(Self::FIRST_EDITABLE)
    }

    /// Steps whose state is mirrored into the draft cache.
    pub fn is_editable(self) -> bool {
        (Self::FIRST_EDITABLE..=Self::LAST_EDITABLE).contains(&self)
    }

    pub fn is_reminder(self) -> bool {
        matches!(self, Self::Reminder | Self::Intro)
    }

    pub fn next(self) -> Option<Step> {
        Self::from_number(self.number() as i64 + 1)
    }

    pub fn prev(self) -> Option<Step> {
        Self::from_number(self.number() as i64 - 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Reminder | Self::Intro => "Before you report",
            Self::Agency => "Choose an agency",
            Self::Topic => "Choose a topic",
            Self::Source => "Where did you see it?",
            Self::Details => "Describe the information",
            Self::Review => "Review your report",
            Self::View => "Report submitted",
        }
    }
}
