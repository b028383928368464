//! Entertainment groups and channel ordering.
//!
//! The bridge lists a group's lights in a fixed order.  That order is the
//! canonical channel order for the whole session: the light at index `i` is
//! streamed as channel `i`.

use thiserror::Error;

use crate::domain::light_state::ChannelId;

/// A bridge-side set of lights configured for low-latency streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntertainmentGroup {
    /// Bridge-assigned group id (e.g. `"1"`).
    pub id: String,
    /// Human-readable name shown in the Hue app.
    pub name: String,
    /// Light ids in the bridge's canonical order.
    pub fixture_ids: Vec<String>,
}

/// Errors deriving the channel layout of a group.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("group {0} has no lights")]
    NoFixtures(String),
    #[error("group {id} has {count} lights; at most 256 channels fit in a frame")]
    TooManyFixtures { id: String, count: usize },
}

/// Errors choosing the group to stream to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupSelectionError {
    #[error("no entertainment groups found")]
    Empty,
    #[error("{} entertainment groups found; specify one with --group-id", .candidates.len())]
    Ambiguous { candidates: Vec<EntertainmentGroup> },
}

impl EntertainmentGroup {
    /// Returns the channel ids `0..n` in canonical order.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] for an empty group or one with more than 256
    /// lights.
    pub fn channel_ids(&self) -> Result<Vec<ChannelId>, GroupError> {
        let count = self.fixture_ids.len();
        if count == 0 {
            return Err(GroupError::NoFixtures(self.id.clone()));
        }
        if count > usize::from(ChannelId::MAX) + 1 {
            return Err(GroupError::TooManyFixtures {
                id: self.id.clone(),
                count,
            });
        }
        Ok((0..count).map(|i| i as ChannelId).collect())
    }
}

/// Picks the single group matching `selector` (or the single group overall
/// when no selector is given).
///
/// # Errors
///
/// Returns [`GroupSelectionError::Empty`] when nothing matches and
/// [`GroupSelectionError::Ambiguous`] when more than one group matches.
pub fn select_group(
    groups: Vec<EntertainmentGroup>,
    selector: Option<&str>,
) -> Result<EntertainmentGroup, GroupSelectionError> {
    let mut candidates: Vec<EntertainmentGroup> = groups
        .into_iter()
        .filter(|g| selector.map_or(true, |id| g.id == id))
        .collect();

    match candidates.len() {
        0 => Err(GroupSelectionError::Empty),
        1 => Ok(candidates.remove(0)),
        _ => Err(GroupSelectionError::Ambiguous { candidates }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
