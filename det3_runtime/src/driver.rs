//! Stimulus driver.
//!
//! Turns queued `MatrixItem`s into one `Stimulus` per edge. Progress is
//! gated on `request` as sampled before the edge: while it is low the
//! driver parks the bus and waits, so delays and elements are only spent
//! on edges the engine is able to use.

use std::collections::VecDeque;

use tracing::{debug, info};

use det3_engine::arithmetic::ELEMENT_COUNT;
use det3_engine::{Outputs, Stimulus};

use crate::config::IdleData;
use crate::items::MatrixItem;

#[derive(Debug)]
struct InFlight {
    item: MatrixItem,
    /// Next element to present, in fill order.
    index: usize,
    delay_left: u32,
}

#[derive(Debug)]
pub struct Driver {
    queue: VecDeque<MatrixItem>,
    current: Option<InFlight>,
    idle: IdleData,
    completed: usize,
    aborted: usize,
}

impl Driver {
    pub fn new(items: impl IntoIterator<Item = MatrixItem>, idle: IdleData) -> Self {
        Self {
            queue: items.into_iter().collect(),
            current: None,
            idle,
            completed: 0,
            aborted: 0,
        }
    }

    /// Nothing queued and nothing in flight.
    pub fn is_drained(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Items whose ninth element was presented.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Items abandoned because reset hit them mid-drive.
    pub fn aborted(&self) -> usize {
        self.aborted
    }

    /// Produce the stimulus for edge `cycle`, given the outputs sampled
    /// before it and whether reset is asserted this cycle.
    pub fn drive(&mut self, cycle: u64, before: &Outputs, reset: bool) -> Stimulus {
        if reset {
            if let Some(flight) = self.current.take() {
                info!(cycle, element = flight.index, "reset detected, aborting drive");
                self.aborted += 1;
            }
            let mut s = Stimulus::reset(cycle);
            s.data = self.idle.value();
            return s;
        }

        if !before.request {
            return Stimulus::idle(cycle, self.idle.value());
        }

        if self.current.is_none() {
            match self.queue.pop_front() {
                Some(item) => {
                    debug!(cycle, %item, "driving item");
                    let delay_left = item.delay_at(0);
                    self.current = Some(InFlight {
                        item,
                        index: 0,
                        delay_left,
                    });
                }
                None => return Stimulus::idle(cycle, self.idle.value()),
            }
        }

        let Some(flight) = self.current.as_mut() else {
            return Stimulus::idle(cycle, self.idle.value());
        };

        if flight.delay_left > 0 {
            flight.delay_left -= 1;
            return Stimulus::idle(cycle, self.idle.value());
        }

        let data = flight.item.matrix.row_major()[flight.index];
        flight.index += 1;
        if flight.index == ELEMENT_COUNT {
            self.current = None;
            self.completed += 1;
        } else {
            flight.delay_left = flight.item.delay_at(flight.index);
        }
        Stimulus::element(cycle, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use det3_engine::Matrix;

    const READY: Outputs = Outputs {
        request: true,
        result: 0,
        result_valid: false,
        overflow: false,
    };

    const BUSY: Outputs = Outputs {
        request: false,
        result: 0,
        result_valid: true,
        overflow: false,
    };

    #[test]
    fn delays_precede_each_element() {
        let item = MatrixItem::new(Matrix::identity()).with_uniform_delay(2);
        let mut d = Driver::new([item], IdleData::Pattern);
        let mut stimuli = Vec::new();
        for cycle in 1..=27 {
            stimuli.push(d.drive(cycle, &READY, false));
        }
        let valid: Vec<usize> = stimuli
            .iter()
            .enumerate()
            .filter(|(_, s)| s.valid)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(valid, vec![2, 5, 8, 11, 14, 17, 20, 23, 26]);
        assert_eq!(stimuli[0].data as u16, 0xAAAA);
        assert!(d.is_drained());
        assert_eq!(d.completed(), 1);
    }

    #[test]
    fn stalls_while_request_low() {
        let mut d = Driver::new([MatrixItem::new(Matrix::identity())], IdleData::Zero);
        let s = d.drive(1, &BUSY, false);
        assert!(!s.valid);
        let s = d.drive(2, &READY, false);
        assert!(s.valid);
        assert_eq!(s.data, 1);
    }

    #[test]
    fn reset_aborts_item_in_flight() {
        let items = [
            MatrixItem::new(Matrix::scalar(5)),
            MatrixItem::new(Matrix::scalar(7)),
        ];
        let mut d = Driver::new(items, IdleData::Zero);
        d.drive(1, &READY, false);
        d.drive(2, &READY, false);
        let s = d.drive(3, &READY, true);
        assert!(s.reset);
        assert!(!s.valid);
        assert_eq!(d.aborted(), 1);

        // Next item starts from its first element.
        let s = d.drive(4, &READY, false);
        assert_eq!(s.data, 7);
    }

    #[test]
    fn idles_when_drained() {
        let mut d = Driver::new(Vec::new(), IdleData::Zero);
        assert!(d.is_drained());
        let s = d.drive(1, &READY, false);
        assert!(!s.valid && !s.reset);
    }
}
