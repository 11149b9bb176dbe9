//! Witness arena with reference-counted GC (component E).
//!
//! Grounded on `original_source/include/zkp/gc.hpp`'s `gc_row`/
//! `gc_managed_region`: witnesses accumulate into one active linear row and
//! three active quadratic rows (`ql`, `qr`, `qo`); when a row fills, its
//! still-referenced slots are copied forward into a fresh row (`compact`,
//! mirroring `mark_and_sweep`) rather than silently dropped. A quadratic
//! row's live slots are special-cased: they land in the *linear* row
//! (`replace_linear`'s counterpart here), since once a value is no longer
//! paired with the other two legs of its triple it's just a witness, not a
//! quadratic relation, and compaction itself must never emit new `x*y=z`
//! constraints.
//!
//! A handle is `Rc<Cell<Location>>` rather than a raw `shared_ptr<location>`:
//! cloning it is how a caller asks for another
//! reference to the same slot, and `Rc::strong_count` doubles as the
//! reference count `gc_row::reference` kept by hand in the source, so
//! there's no separate `refs` bookkeeping array to go stale. Compaction
//! retargets the shared `Cell` in place, so every outstanding clone sees the
//! slot's new home without the caller doing anything.

use crate::field::Fp;
use crate::prng::{FieldRng, HashPrg};
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

/// The arena could not place a value: the configured row budget (if any)
/// was exhausted by compaction. Distinct from `ArenaError` not having a
/// variant for "relation doesn't hold" -- that's an internal invariant
/// checked with `assert!` in [`crate::constraints`], not a recoverable
/// condition a caller can be expected to handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    /// Compacting a row would exceed the arena's configured row budget.
    #[error("arena exhausted: {0}")]
    Exhausted(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QuadCol {
    L,
    R,
    O,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Location {
    Linear { row: u32, slot: u32 },
    Quad { row: u32, slot: u32, col: QuadCol },
}

/// A capability granting read access to one witness slot. Cloning it grants
/// another reference to the *same* slot (and keeps it alive); the slot
/// becomes eligible for reclamation once every clone has been dropped.
/// Compaction may relocate the slot a handle points to, but never changes
/// which logical witness it names.
#[derive(Clone, Debug)]
pub struct WitnessHandle(Rc<Cell<Location>>);

impl WitnessHandle {
    fn new(loc: Location) -> Self {
        WitnessHandle(Rc::new(Cell::new(loc)))
    }

    fn location(&self) -> Location {
        self.0.get()
    }

    fn retarget(&self, loc: Location) {
        self.0.set(loc);
    }

    fn is_live(&self) -> bool {
        // `> 1` because the arena itself always keeps one clone (in the
        // owning row's `handles` vector) purely for bookkeeping.
        Rc::strong_count(&self.0) > 1
    }
}

impl PartialEq for WitnessHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for WitnessHandle {}

/// A growable row of linear witnesses, plus `t_lin` parallel randomness
/// polynomials. `row_idx` is fixed at construction time
/// to the row's eventual position in `retired_linear` (rows retire in
/// order, so this is known in advance).
struct LinearRow {
    row_idx: u32,
    width: usize,
    values: Vec<Fp>,
    randomness: Vec<Vec<Fp>>,
    handles: Vec<WitnessHandle>,
}

impl LinearRow {
    fn new(row_idx: u32, width: usize, t_lin: usize) -> Self {
        LinearRow {
            row_idx,
            width,
            values: Vec::with_capacity(width),
            randomness: vec![Vec::with_capacity(width); t_lin],
            handles: Vec::with_capacity(width),
        }
    }

    fn is_full(&self) -> bool {
        self.values.len() == self.width
    }

    fn is_live(&self, slot: usize) -> bool {
        self.handles[slot].is_live()
    }

    /// Append a brand-new witness, minting a fresh handle for it.
    fn push(&mut self, v: Fp, randomness_row: Vec<Fp>) -> WitnessHandle {
        let slot = self.values.len() as u32;
        let handle = WitnessHandle::new(Location::Linear { row: self.row_idx, slot });
        self.push_with_handle(v, handle.clone(), randomness_row);
        handle
    }

    /// Append a value under a handle that already exists (relocation during
    /// compaction), retargeting it to this row/slot.
    fn push_with_handle(&mut self, v: Fp, handle: WitnessHandle, randomness_row: Vec<Fp>) {
        let slot = self.values.len() as u32;
        handle.retarget(Location::Linear { row: self.row_idx, slot });
        self.values.push(v);
        for (col, r) in self.randomness.iter_mut().zip(randomness_row) {
            col.push(r);
        }
        self.handles.push(handle);
    }
}

/// One column (`ql`, `qr`, or `qo`) of the active quadratic triple.
struct QuadRow {
    row_idx: u32,
    width: usize,
    col: QuadCol,
    values: Vec<Fp>,
    handles: Vec<WitnessHandle>,
}

impl QuadRow {
    fn new(row_idx: u32, width: usize, col: QuadCol) -> Self {
        QuadRow { row_idx, width, col, values: Vec::with_capacity(width), handles: Vec::with_capacity(width) }
    }

    fn is_full(&self) -> bool {
        self.values.len() == self.width
    }

    fn is_live(&self, slot: usize) -> bool {
        self.handles[slot].is_live()
    }

    fn push(&mut self, v: Fp) -> WitnessHandle {
        let slot = self.values.len() as u32;
        let handle = WitnessHandle::new(Location::Quad { row: self.row_idx, slot, col: self.col });
        self.values.push(v);
        self.handles.push(handle.clone());
        handle
    }
}

/// The witness arena: one active linear row and three active quadratic rows
/// (`ql`, `qr`, `qo`), each retiring into the argument accumulator's input
/// when full, with live slots carried forward by compaction rather than
/// dropped.
pub struct Arena {
    width: usize,
    t_lin: usize,
    max_rows: Option<usize>,
    linear_active: LinearRow,
    retired_linear: Vec<LinearRow>,
    ql_active: QuadRow,
    qr_active: QuadRow,
    qo_active: QuadRow,
    retired_quad: Vec<(QuadRow, QuadRow, QuadRow)>,
    rng: HashPrg,
}

impl Arena {
    /// A fresh arena with row width `width` (the code's block size) and
    /// `t_lin` randomness polynomials per linear row, with no row-count
    /// budget (never returns [`ArenaError::Exhausted`]).
    pub fn new(width: usize, t_lin: usize) -> Self {
        Arena::with_row_budget(width, t_lin, None)
    }

    /// As [`Arena::new`], but caps the total number of rows compaction may
    /// retire before giving up, guarding against unbounded memory growth on
    /// a pathological program that keeps everything alive forever.
    pub fn with_row_budget(width: usize, t_lin: usize, max_rows: Option<usize>) -> Self {
        assert!(width > 0, "arena row width must be positive");
        Arena {
            width,
            t_lin,
            max_rows,
            linear_active: LinearRow::new(0, width, t_lin),
            retired_linear: Vec::new(),
            ql_active: QuadRow::new(0, width, QuadCol::L),
            qr_active: QuadRow::new(0, width, QuadCol::R),
            qo_active: QuadRow::new(0, width, QuadCol::O),
            retired_quad: Vec::new(),
            rng: HashPrg::from_label("myzkp.arena.rebalance.v1"),
        }
    }

    fn fresh_randomness_row(&mut self) -> Vec<Fp> {
        (0..self.t_lin).map(|_| self.rng.uniform_in_field()).collect()
    }

    /// Push one witness value into the active linear row, compacting first
    /// if it's full.
    pub fn push_linear(&mut self, v: Fp) -> Result<WitnessHandle, ArenaError> {
        if self.linear_active.is_full() {
            self.compact_linear()?;
        }
        let randomness_row = self.fresh_randomness_row();
        Ok(self.linear_active.push(v, randomness_row))
    }

    /// Push one quadratic-relation witness triple (`a*b=c`), compacting
    /// first if the active rows are full.
    pub fn push_quadratic(&mut self, a: Fp, b: Fp, c: Fp) -> Result<(WitnessHandle, WitnessHandle, WitnessHandle), ArenaError> {
        if self.ql_active.is_full() {
            self.compact_quadratic()?;
        }
        let ha = self.ql_active.push(a);
        let hb = self.qr_active.push(b);
        let hc = self.qo_active.push(c);
        Ok((ha, hb, hc))
    }

    /// Read a handle's current value, wherever compaction has relocated it
    /// to.
    pub fn value_of(&self, handle: &WitnessHandle) -> Fp {
        match handle.location() {
            Location::Linear { row, slot } => self.linear_values_at(row)[slot as usize],
            Location::Quad { row, slot, col } => self.quad_values_at(row, col)[slot as usize],
        }
    }

    fn linear_values_at(&self, row: u32) -> &[Fp] {
        if row as usize == self.retired_linear.len() {
            &self.linear_active.values
        } else {
            &self.retired_linear[row as usize].values
        }
    }

    fn quad_values_at(&self, row: u32, col: QuadCol) -> &[Fp] {
        if row as usize == self.retired_quad.len() {
            match col {
                QuadCol::L => &self.ql_active.values,
                QuadCol::R => &self.qr_active.values,
                QuadCol::O => &self.qo_active.values,
            }
        } else {
            let (ql, qr, qo) = &self.retired_quad[row as usize];
            match col {
                QuadCol::L => &ql.values,
                QuadCol::R => &qr.values,
                QuadCol::O => &qo.values,
            }
        }
    }

    /// Retire the active linear row, carrying every still-live slot forward
    /// into a fresh row of the same width. A single retiring row has at
    /// most `width` live slots, which always fits the fresh row of the same
    /// width, so this never itself needs a second target row -- only the
    /// row-count budget (if configured) can turn this into
    /// [`ArenaError::Exhausted`].
    fn compact_linear(&mut self) -> Result<(), ArenaError> {
        if let Some(max) = self.max_rows {
            if self.retired_linear.len() + 1 > max {
                return Err(ArenaError::Exhausted(format!(
                    "linear row budget exhausted: {max} row(s) already retired"
                )));
            }
        }
        let old_idx = self.retired_linear.len() as u32;
        let mut old = std::mem::replace(&mut self.linear_active, LinearRow::new(old_idx + 1, self.width, self.t_lin));
        old.row_idx = old_idx;

        for slot in 0..old.values.len() {
            if !old.is_live(slot) {
                continue;
            }
            let mut randomness_row = Vec::with_capacity(self.t_lin);
            for t in 0..self.t_lin {
                let r = self.rng.uniform_in_field();
                old.randomness[t][slot] = old.randomness[t][slot] - r;
                randomness_row.push(r);
            }
            self.linear_active.push_with_handle(old.values[slot], old.handles[slot].clone(), randomness_row);
        }
        self.retired_linear.push(old);
        Ok(())
    }

    /// Retire the active quadratic triple. Live slots become ordinary
    /// linear witnesses in the current linear row (via [`Self::push_linear`]
    /// -style relocation, which may itself trigger [`Self::compact_linear`]);
    /// the quadratic rows themselves always come back empty.
    fn compact_quadratic(&mut self) -> Result<(), ArenaError> {
        if let Some(max) = self.max_rows {
            if self.retired_quad.len() + 1 > max {
                return Err(ArenaError::Exhausted(format!(
                    "quadratic row budget exhausted: {max} row-triple(s) already retired"
                )));
            }
        }
        let old_idx = self.retired_quad.len() as u32;
        let width = self.width;
        let mut ql = std::mem::replace(&mut self.ql_active, QuadRow::new(old_idx + 1, width, QuadCol::L));
        let mut qr = std::mem::replace(&mut self.qr_active, QuadRow::new(old_idx + 1, width, QuadCol::R));
        let mut qo = std::mem::replace(&mut self.qo_active, QuadRow::new(old_idx + 1, width, QuadCol::O));
        ql.row_idx = old_idx;
        qr.row_idx = old_idx;
        qo.row_idx = old_idx;

        for row in [&ql, &qr, &qo] {
            for slot in 0..row.values.len() {
                if row.is_live(slot) {
                    self.relocate_into_linear(row.values[slot], row.handles[slot].clone())?;
                }
            }
        }
        self.retired_quad.push((ql, qr, qo));
        Ok(())
    }

    fn relocate_into_linear(&mut self, v: Fp, handle: WitnessHandle) -> Result<(), ArenaError> {
        if self.linear_active.is_full() {
            self.compact_linear()?;
        }
        let randomness_row = self.fresh_randomness_row();
        self.linear_active.push_with_handle(v, handle, randomness_row);
        Ok(())
    }

    /// Force the active rows to retire even if not full, padding the
    /// remainder with zero witnesses. Call once at the end of a run, before
    /// reading back rows for encoding.
    pub fn flush(&mut self) -> Result<(), ArenaError> {
        if !self.linear_active.values.is_empty() {
            while self.linear_active.values.len() < self.width {
                self.push_linear(Fp::ZERO)?;
            }
            self.compact_linear()?;
        }
        if !self.ql_active.values.is_empty() {
            while self.ql_active.values.len() < self.width {
                self.push_quadratic(Fp::ZERO, Fp::ZERO, Fp::ZERO)?;
            }
            self.compact_quadratic()?;
        }
        Ok(())
    }

    /// Number of fully-retired linear rows.
    pub fn linear_row_count(&self) -> usize {
        self.retired_linear.len()
    }

    /// Number of fully-retired quadratic row triples.
    pub fn quadratic_row_count(&self) -> usize {
        self.retired_quad.len()
    }

    /// Read back a retired linear row's values, for the code argument
    /// (component J) to Reed-Solomon-encode.
    pub fn linear_row(&self, idx: usize) -> &[Fp] {
        &self.retired_linear[idx].values
    }

    /// Read back a retired quadratic row triple's values.
    pub fn quadratic_row(&self, idx: usize) -> (&[Fp], &[Fp], &[Fp]) {
        let (ql, qr, qo) = &self.retired_quad[idx];
        (&ql.values, &qr.values, &qo.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_rows_retire_at_width() {
        let mut arena = Arena::new(4, 2);
        for i in 0..10 {
            arena.push_linear(Fp::new(i)).unwrap();
        }
        assert_eq!(arena.linear_row_count(), 2);
        arena.flush().unwrap();
        assert_eq!(arena.linear_row_count(), 3);
        assert_eq!(arena.linear_row(2), &[Fp::new(8), Fp::new(9), Fp::ZERO, Fp::ZERO]);
    }

    #[test]
    fn quadratic_rows_stay_aligned() {
        let mut arena = Arena::new(2, 1);
        for i in 0..5u64 {
            arena.push_quadratic(Fp::new(i), Fp::new(i + 1), Fp::new(i * (i + 1))).unwrap();
        }
        assert_eq!(arena.quadratic_row_count(), 2);
        let (ql, qr, qo) = arena.quadratic_row(0);
        assert_eq!(ql, &[Fp::new(0), Fp::new(1)]);
        assert_eq!(qr, &[Fp::new(1), Fp::new(2)]);
        assert_eq!(qo, &[Fp::new(0), Fp::new(2)]);
    }

    #[test]
    fn dead_slots_do_not_survive_compaction() {
        let mut arena = Arena::new(2, 1);
        arena.push_linear(Fp::new(1)).unwrap(); // dropped immediately: dead
        let live = arena.push_linear(Fp::new(2)).unwrap();
        // row is now full (width 2); the next push compacts it.
        arena.push_linear(Fp::new(3)).unwrap();
        assert_eq!(arena.linear_row_count(), 1);
        // the live handle must read the same value after relocation.
        assert_eq!(arena.value_of(&live), Fp::new(2));
    }

    #[test]
    fn live_handle_tracks_value_across_compaction() {
        let mut arena = Arena::new(1, 2);
        let a = arena.push_linear(Fp::new(7)).unwrap();
        // width is 1, so this immediately compacts the row holding `a`.
        let b = arena.push_linear(Fp::new(8)).unwrap();
        assert_eq!(arena.value_of(&a), Fp::new(7));
        assert_eq!(arena.value_of(&b), Fp::new(8));
        assert_eq!(arena.linear_row_count(), 1);
    }

    #[test]
    fn quadratic_compaction_redirects_live_values_into_the_linear_row() {
        let mut arena = Arena::new(4, 1);
        let (a, b, c) = arena.push_quadratic(Fp::new(3), Fp::new(4), Fp::new(12)).unwrap();
        let before = arena.linear_row_count();
        // fill the rest of the quadratic row so the next push retires it.
        for i in 0..3u64 {
            arena.push_quadratic(Fp::new(i), Fp::new(i), Fp::new(i * i)).unwrap();
        }
        arena.push_quadratic(Fp::new(9), Fp::new(9), Fp::new(81)).unwrap();
        assert_eq!(arena.quadratic_row_count(), 1);
        // a, b, c were live when their row retired, so they now live in the
        // linear row instead of the (fresh, empty) quadratic rows.
        assert!(arena.linear_row_count() > before);
        assert_eq!(arena.value_of(&a), Fp::new(3));
        assert_eq!(arena.value_of(&b), Fp::new(4));
        assert_eq!(arena.value_of(&c), Fp::new(12));
    }

    #[test]
    fn row_budget_is_enforced() {
        let mut arena = Arena::with_row_budget(1, 1, Some(1));
        let kept = arena.push_linear(Fp::new(1)).unwrap();
        let err = arena.push_linear(Fp::new(2)).unwrap_err();
        assert!(matches!(err, ArenaError::Exhausted(_)));
        drop(kept);
    }

    #[test]
    fn dropping_a_handle_lets_its_slot_die() {
        let mut arena = Arena::new(1, 1);
        {
            let h = arena.push_linear(Fp::new(1)).unwrap();
            assert!(h.is_live());
        }
        // compacting now should find nothing live to carry forward.
        arena.push_linear(Fp::new(2)).unwrap();
        assert_eq!(arena.linear_row_count(), 1);
    }
}
