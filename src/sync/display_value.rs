//! Default display value selection.

use crate::meta::{Column, NewColumn};

/// A column that can carry the display-value flag.
pub trait DisplayCandidate {
    fn is_pk(&self) -> bool;
    fn is_pv(&self) -> bool;
    fn set_pv(&mut self, pv: bool);
}

impl DisplayCandidate for NewColumn {
    fn is_pk(&self) -> bool {
        self.pk
    }

    fn is_pv(&self) -> bool {
        self.pv
    }

    fn set_pv(&mut self, pv: bool) {
        self.pv = pv;
    }
}

impl DisplayCandidate for Column {
    fn is_pk(&self) -> bool {
        self.pk
    }

    fn is_pv(&self) -> bool {
        self.pv
    }

    fn set_pv(&mut self, pv: bool) {
        self.pv = pv;
    }
}

/// Flag the display value column next to the primary key.
///
/// The primary key is the last one found scanning from the end. When it is
/// the last column the column before it is picked, otherwise the column
/// after it. Nothing changes when a column is already flagged or there is no
/// primary key. Returns the index of the newly flagged column.
pub fn assign_display_value<C: DisplayCandidate>(columns: &mut [C]) -> Option<usize> {
    if columns.iter().any(|c| c.is_pv()) {
        return None;
    }

    let pk = columns.iter().rposition(|c| c.is_pk())?;
    let target = if pk == columns.len() - 1 {
        pk.checked_sub(1)?
    } else {
        pk + 1
    };

    columns[target].set_pv(true);
    Some(target)
}
