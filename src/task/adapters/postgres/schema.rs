//! Diesel schema for task board persistence.

diesel::table! {
    /// Task records grouped into dense per-project, per-status partitions.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Board column; `NULL` is the backlog.
        #[max_length = 20]
        status -> Nullable<Varchar>,
        /// Dense position within the partition.
        #[sql_name = "order"]
        position -> Int4,
        /// Optional assigned member.
        assigned_to_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
