//! Channel model
//!
//! A channel is one physical line on one of the two expander groups:
//! the relay group (outputs) or the sensor group (inputs). Pair `p` with
//! role `r` lives on line `2p + r` of each group.

/// Number of relay pairs driven by the sequencer
pub const PAIR_COUNT: usize = 3;

/// Lines per channel group (relays or sensors)
pub const GROUP_WIDTH: usize = PAIR_COUNT * 2;

/// Raw electrical level of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Build a level from a pin bit
    pub fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Check if this is the high level
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    /// The opposite level
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Electrical convention of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Logical ACTIVE is electrically HIGH
    ActiveHigh,
    /// Logical ACTIVE is electrically LOW
    ActiveLow,
}

impl Polarity {
    /// Raw level that represents the given logical state
    pub fn level_for(self, active: bool) -> Level {
        match self {
            Polarity::ActiveHigh => Level::from_high(active),
            Polarity::ActiveLow => Level::from_high(!active),
        }
    }

    /// Logical state represented by a raw level
    pub fn is_active(self, level: Level) -> bool {
        level == self.level_for(true)
    }

    /// Raw level of the logical INACTIVE state
    pub fn inactive_level(self) -> Level {
        self.level_for(false)
    }
}

/// Which of a pair's two channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    A,
    B,
}

impl Role {
    /// Both roles, A first
    pub const ALL: [Role; 2] = [Role::A, Role::B];

    /// The counterpart role
    pub fn opposite(self) -> Self {
        match self {
            Role::A => Role::B,
            Role::B => Role::A,
        }
    }

    /// Offset of this role within its pair
    pub fn offset(self) -> u8 {
        match self {
            Role::A => 0,
            Role::B => 1,
        }
    }
}

/// Channel group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelKind {
    Relay,
    Sensor,
}

/// Identifies one physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId {
    pub pair: u8,
    pub role: Role,
    pub kind: ChannelKind,
}

impl ChannelId {
    /// Relay channel of a pair
    pub const fn relay(pair: u8, role: Role) -> Self {
        Self {
            pair,
            role,
            kind: ChannelKind::Relay,
        }
    }

    /// Sensor channel of a pair
    pub const fn sensor(pair: u8, role: Role) -> Self {
        Self {
            pair,
            role,
            kind: ChannelKind::Sensor,
        }
    }

    /// Line number within the channel's group
    pub fn line(self) -> u8 {
        self.pair * 2 + self.role.offset()
    }

    /// Channel for a line of a group, if the line exists
    pub fn from_line(kind: ChannelKind, line: u8) -> Option<Self> {
        if line as usize >= GROUP_WIDTH {
            return None;
        }
        let role = if line % 2 == 0 { Role::A } else { Role::B };
        Some(Self {
            pair: line / 2,
            role,
            kind,
        })
    }

    /// The other channel of the same pair and group
    pub fn partner(self) -> Self {
        Self {
            role: self.role.opposite(),
            ..self
        }
    }
}

/// Polarity assignment for both channel groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap {
    pub relay: Polarity,
    pub sensor: Polarity,
}

impl ChannelMap {
    /// Active-low relay board with pulled-up sensor inputs
    pub const fn relay_board() -> Self {
        Self {
            relay: Polarity::ActiveLow,
            sensor: Polarity::ActiveLow,
        }
    }

    /// Polarity of a channel's group
    pub fn polarity(&self, channel: ChannelId) -> Polarity {
        match channel.kind {
            ChannelKind::Relay => self.relay,
            ChannelKind::Sensor => self.sensor,
        }
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::relay_board()
    }
}
