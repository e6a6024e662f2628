use log::trace;

use crate::error::RabiesError;
use crate::landscape::{CellId, Direction, Landscape};
use crate::random::RandomStream;

// Chance per hop that the heading drifts one sixth of a turn either way.
const DRIFT_PROBABILITY: f64 = 0.25;

impl Landscape {
    /// Walks up to `hops` cells away from `start`, heading roughly in
    /// `bias`.
    ///
    /// Each hop the accumulated drift may move one step counter-clockwise or
    /// clockwise; it stays within one sixth of a turn of `bias`. The walk
    /// stops early when the heading has no neighbour, or when crossing into
    /// another super-region fails its resistance check: the crossing
    /// succeeds with probability `(1 - out/100) * (1 - in/100)`, using the
    /// outbound resistance of the region being left and the inbound
    /// resistance of the region being entered.
    ///
    /// The returned path excludes `start`. Its last cell is the new location,
    /// and an empty path means the animal stays where it is.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if `start` is not a cell of
    /// this landscape.
    pub fn calculate_path(
        &self,
        start: CellId,
        hops: usize,
        bias: Direction,
        stream: &mut RandomStream,
    ) -> Result<Vec<CellId>, RabiesError> {
        let mut current = self.cell(start)?;
        let mut path = Vec::with_capacity(hops);
        let mut drift = 0_i32;

        for _ in 0..hops {
            let draw = stream.next_uniform01();
            if draw < DRIFT_PROBABILITY {
                drift -= 1;
            } else if draw < 2.0 * DRIFT_PROBABILITY {
                drift += 1;
            }
            drift = drift.clamp(-1, 1);
            let heading = bias.rotate(drift);

            let Some(next_id) = current.neighbor(heading) else {
                trace!("path from {start} ends at the landscape edge");
                break;
            };
            let next = self.cell(next_id)?;

            if next.super_region() != current.super_region() {
                let leaving = self.super_region(current.super_region());
                let entering = self.super_region(next.super_region());
                let pass = (1.0 - f64::from(leaving.outbound_resistance) / 100.0)
                    * (1.0 - f64::from(entering.inbound_resistance) / 100.0);
                if stream.next_uniform01() >= pass {
                    trace!(
                        "path from {start} blocked between {} and {}",
                        leaving.key,
                        entering.key
                    );
                    break;
                }
            }

            path.push(next_id);
            current = next;
        }
        Ok(path)
    }
}
