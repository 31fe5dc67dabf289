//! Partial updates as typed column assignments.
//!
//! A patch is flattened into a list of assignments, one per field that is
//! present. The Postgres backend renders that list through a single
//! parameterized `QueryBuilder`; column names come only from the enum, and
//! every value is bound. The in-memory backend applies the same list to its
//! rows, so both backends agree on what a patch changes.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::{Task, TaskPatch, TaskPriority, TaskStatus, User, UserPatch};

pub trait ColumnAssignment {
    fn column(&self) -> &'static str;

    fn push_bind_value<'args>(self, builder: &mut QueryBuilder<'args, Postgres>);
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskAssignment {
    Title(String),
    Description(String),
    Status(TaskStatus),
    Priority(TaskPriority),
    DueDate(DateTime<Utc>),
    CategoryId(Uuid),
    Tags(Vec<String>),
}

impl ColumnAssignment for TaskAssignment {
    fn column(&self) -> &'static str {
        match self {
            TaskAssignment::Title(_) => "title",
            TaskAssignment::Description(_) => "description",
            TaskAssignment::Status(_) => "status",
            TaskAssignment::Priority(_) => "priority",
            TaskAssignment::DueDate(_) => "due_date",
            TaskAssignment::CategoryId(_) => "category_id",
            TaskAssignment::Tags(_) => "tags",
        }
    }

    fn push_bind_value<'args>(self, builder: &mut QueryBuilder<'args, Postgres>) {
        match self {
            TaskAssignment::Title(v) | TaskAssignment::Description(v) => {
                builder.push_bind(v);
            }
            TaskAssignment::Status(v) => {
                builder.push_bind(v.as_str());
            }
            TaskAssignment::Priority(v) => {
                builder.push_bind(v.as_str());
            }
            TaskAssignment::DueDate(v) => {
                builder.push_bind(v);
            }
            TaskAssignment::CategoryId(v) => {
                builder.push_bind(v);
            }
            TaskAssignment::Tags(v) => {
                builder.push_bind(v);
            }
        }
    }
}

impl TaskAssignment {
    pub fn apply(self, task: &mut Task) {
        match self {
            TaskAssignment::Title(v) => task.title = v,
            TaskAssignment::Description(v) => task.description = v,
            TaskAssignment::Status(v) => task.status = v,
            TaskAssignment::Priority(v) => task.priority = v,
            TaskAssignment::DueDate(v) => task.due_date = v,
            TaskAssignment::CategoryId(v) => task.category_id = v,
            TaskAssignment::Tags(v) => task.tags = v,
        }
    }
}

impl TaskPatch {
    pub fn into_assignments(self) -> Vec<TaskAssignment> {
        let mut assignments = Vec::new();
        if let Some(v) = self.title {
            assignments.push(TaskAssignment::Title(v));
        }
        if let Some(v) = self.description {
            assignments.push(TaskAssignment::Description(v));
        }
        if let Some(v) = self.status {
            assignments.push(TaskAssignment::Status(v));
        }
        if let Some(v) = self.priority {
            assignments.push(TaskAssignment::Priority(v));
        }
        if let Some(v) = self.due_date {
            assignments.push(TaskAssignment::DueDate(v));
        }
        if let Some(v) = self.category_id {
            assignments.push(TaskAssignment::CategoryId(v));
        }
        if let Some(v) = self.tags {
            assignments.push(TaskAssignment::Tags(v));
        }
        assignments
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAssignment {
    Name(String),
    Email(String),
}

impl ColumnAssignment for UserAssignment {
    fn column(&self) -> &'static str {
        match self {
            UserAssignment::Name(_) => "name",
            UserAssignment::Email(_) => "email",
        }
    }

    fn push_bind_value<'args>(self, builder: &mut QueryBuilder<'args, Postgres>) {
        match self {
            UserAssignment::Name(v) | UserAssignment::Email(v) => {
                builder.push_bind(v);
            }
        }
    }
}

impl UserAssignment {
    pub fn apply(self, user: &mut User) {
        match self {
            UserAssignment::Name(v) => user.name = v,
            UserAssignment::Email(v) => user.email = v,
        }
    }
}

impl UserPatch {
    pub fn into_assignments(self) -> Vec<UserAssignment> {
        let mut assignments = Vec::new();
        if let Some(v) = self.name {
            assignments.push(UserAssignment::Name(v));
        }
        if let Some(v) = self.email {
            assignments.push(UserAssignment::Email(v));
        }
        assignments
    }
}

/// Starts `UPDATE <table> SET updated_at = $1, <col> = $n, ...`.
/// The caller appends the `WHERE` and `RETURNING` clauses.
pub fn build_update<'args, A: ColumnAssignment>(
    table: &'static str,
    assignments: Vec<A>,
    now: DateTime<Utc>,
) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {table} SET updated_at = "));
    builder.push_bind(now);
    for assignment in assignments {
        builder.push(", ");
        builder.push(assignment.column());
        builder.push(" = ");
        assignment.push_bind_value(&mut builder);
    }
    builder
}
