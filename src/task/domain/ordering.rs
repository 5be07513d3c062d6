//! Reordering planner for dense per-column task positions.
//!
//! A partition is the set of tasks sharing a project and a column. Within a
//! partition positions are always `0..n` with no gaps or duplicates. The
//! planner turns a move or a removal into a list of [`Shift`]s over sibling
//! ranges; adapters apply those shifts and the moved task's own update inside
//! one atomic unit.

use super::{Column, Position, ProjectId, Task};
use serde::{Deserialize, Serialize};

/// Tasks sharing one project and one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    project_id: ProjectId,
    column: Column,
}

impl Partition {
    /// Creates a partition key.
    #[must_use]
    pub const fn new(project_id: ProjectId, column: Column) -> Self {
        Self { project_id, column }
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the column, `None` for the backlog.
    #[must_use]
    pub const fn column(&self) -> Column {
        self.column
    }
}

/// Direction in which a sibling range moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftDirection {
    /// Every position in the range grows by one.
    Up,
    /// Every position in the range shrinks by one.
    Down,
}

impl ShiftDirection {
    /// Signed amount added to each position.
    #[must_use]
    pub const fn delta(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// A contiguous range of sibling positions to move by one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shift {
    column: Column,
    from: Position,
    through: Option<Position>,
    direction: ShiftDirection,
}

impl Shift {
    const fn new(
        column: Column,
        from: Position,
        through: Option<Position>,
        direction: ShiftDirection,
    ) -> Self {
        Self {
            column,
            from,
            through,
            direction,
        }
    }

    /// Column whose tasks are shifted (within the moved task's project).
    #[must_use]
    pub const fn column(&self) -> Column {
        self.column
    }

    /// Inclusive lower bound of the affected positions.
    #[must_use]
    pub const fn from(&self) -> Position {
        self.from
    }

    /// Inclusive upper bound, or `None` for "to the end of the column".
    #[must_use]
    pub const fn through(&self) -> Option<Position> {
        self.through
    }

    /// Direction of the shift.
    #[must_use]
    pub const fn direction(&self) -> ShiftDirection {
        self.direction
    }

    /// Returns whether a sibling at `column`/`position` falls in the range.
    #[must_use]
    pub fn covers(&self, column: Column, position: Position) -> bool {
        column == self.column
            && position >= self.from
            && self.through.is_none_or(|upper| position <= upper)
    }

    /// Returns the position a covered sibling ends up at.
    #[must_use]
    pub const fn apply(&self, position: Position) -> Position {
        match self.direction {
            ShiftDirection::Up => position.next(),
            ShiftDirection::Down => position.previous(),
        }
    }
}

/// Outcome of planning a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    column: Column,
    position: Position,
    shifts: Vec<Shift>,
}

impl MovePlan {
    /// Column the task lands in.
    #[must_use]
    pub const fn column(&self) -> Column {
        self.column
    }

    /// Position the task lands at, after clamping.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Sibling shifts to apply alongside the task's own update.
    #[must_use]
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Returns `true` when the task stays exactly where it is.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.shifts.is_empty()
    }
}

/// Plans relocating `task` to `requested` within `column`.
///
/// `others_in_destination` counts the destination partition's tasks
/// excluding `task` itself, so the requested order is clamped to `[0, n]` for
/// a cross-column move and `[0, n - 1]` within the same column.
#[must_use]
pub fn plan_move(
    task: &Task,
    column: Column,
    requested: i64,
    others_in_destination: u32,
) -> MovePlan {
    let position = Position::clamped(requested, Position::new(others_in_destination));
    let current = task.position();

    let shifts = if column == task.status() {
        if current < position {
            vec![Shift::new(
                column,
                current.next(),
                Some(position),
                ShiftDirection::Down,
            )]
        } else if current > position {
            vec![Shift::new(
                column,
                position,
                Some(current.previous()),
                ShiftDirection::Up,
            )]
        } else {
            Vec::new()
        }
    } else {
        vec![
            Shift::new(column, position, None, ShiftDirection::Up),
            plan_removal(task),
        ]
    };

    MovePlan {
        column,
        position,
        shifts,
    }
}

/// Plans closing the gap `task` leaves behind in its partition.
#[must_use]
pub const fn plan_removal(task: &Task) -> Shift {
    Shift::new(
        task.status(),
        task.position().next(),
        None,
        ShiftDirection::Down,
    )
}
