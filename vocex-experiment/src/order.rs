use tracing::debug;
use vocex_core::{PlannedTrial, SessionConfig, SessionError, StimulusItem, TrialPlan};

use crate::rng;

/// Build the full trial schedule for one participant.
///
/// The catalog is split into its two lists (index halves when the catalog
/// carries no list grouping), each half is permuted independently with the
/// seeded generator, and the halves are interleaved one-for-one. The
/// leading half and the attempt-1 voice are both functions of the
/// identifier's numeric parity, so the whole schedule is a pure function
/// of the identifier: no clock, no hardware entropy.
///
/// Attempt 2 replays attempt 1's merged order exactly, with the
/// complementary voice.
pub fn build_plan(
    catalog: &[StimulusItem],
    session: &SessionConfig,
) -> Result<TrialPlan, SessionError> {
    if catalog.is_empty() {
        return Err(SessionError::Configuration("stimulus catalog is empty".into()));
    }

    let state = rng::seed(session.seed);
    let (mut first, mut second) = partition(catalog);
    let state = rng::shuffle(state, &mut first);
    let _ = rng::shuffle(state, &mut second);

    let merged = if session.numeric_id % 2 == 0 {
        interleave(&first, &second)
    } else {
        interleave(&second, &first)
    };
    debug!(
        seed = session.seed,
        items = merged.len(),
        first_voice = %session.first_voice,
        "merged stimulus order built"
    );

    let mut trials = Vec::with_capacity(merged.len() * 2);
    for item in &merged {
        trials.push(PlannedTrial {
            item: (*item).clone(),
            attempt: 1,
            voice: session.first_voice,
        });
    }
    for item in &merged {
        trials.push(PlannedTrial {
            item: (*item).clone(),
            attempt: 2,
            voice: session.first_voice.other(),
        });
    }

    Ok(TrialPlan {
        participant_id: session.participant_id.clone(),
        seed: session.seed,
        first_voice: session.first_voice,
        trials,
    })
}

/// Split the catalog into its two halves: by list grouping when present,
/// by index otherwise.
fn partition(catalog: &[StimulusItem]) -> (Vec<&StimulusItem>, Vec<&StimulusItem>) {
    let min_list = catalog.iter().map(|i| i.list).min().unwrap_or(1);
    let max_list = catalog.iter().map(|i| i.list).max().unwrap_or(1);
    if min_list == max_list {
        let mid = catalog.len().div_ceil(2);
        let (a, b) = catalog.split_at(mid);
        (a.iter().collect(), b.iter().collect())
    } else {
        catalog.iter().partition(|item| item.list == min_list)
    }
}

fn interleave<'a>(
    lead: &[&'a StimulusItem],
    follow: &[&'a StimulusItem],
) -> Vec<&'a StimulusItem> {
    let mut merged = Vec::with_capacity(lead.len() + follow.len());
    let mut lead_iter = lead.iter();
    let mut follow_iter = follow.iter();
    loop {
        match (lead_iter.next(), follow_iter.next()) {
            (None, None) => break,
            (a, b) => {
                if let Some(item) = a {
                    merged.push(*item);
                }
                if let Some(item) = b {
                    merged.push(*item);
                }
            }
        }
    }
    merged
}
