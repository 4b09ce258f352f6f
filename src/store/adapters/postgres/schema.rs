//! Diesel schema for the coordination store.

diesel::table! {
    /// Mirroring tasks with their optimistic-lock token.
    tasks (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Owning user.
        #[max_length = 255]
        owner_id -> Varchar,
        /// Target registry.
        registry_id -> Int8,
        /// Assigned agent, null while unassigned.
        #[max_length = 255]
        agent_name -> Nullable<Varchar>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Optimistic-lock token.
        resource_version -> Int8,
        /// Latest status message.
        message -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        modified_at -> Timestamptz,
    }
}

diesel::table! {
    /// Agent liveness records.
    agents (name) {
        /// Unique agent name.
        #[max_length = 255]
        name -> Varchar,
        /// Liveness status.
        #[max_length = 50]
        status -> Varchar,
        /// Deployment kind.
        #[max_length = 50]
        kind -> Varchar,
        /// Latest status message.
        message -> Text,
        /// Latest heartbeat.
        last_heartbeat -> Timestamptz,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Push destinations.
    registries (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Owning user.
        #[max_length = 255]
        owner_id -> Varchar,
        /// Registry host.
        #[max_length = 255]
        repository -> Varchar,
        /// Namespace under the host.
        #[max_length = 255]
        namespace -> Varchar,
        /// Login user.
        #[max_length = 255]
        username -> Varchar,
        /// Login password.
        password -> Text,
    }
}

diesel::table! {
    /// Per-image pipeline outcomes.
    images (id) {
        /// Store-assigned identifier.
        id -> Int8,
        /// Owning task.
        task_id -> Int8,
        /// Source reference.
        #[max_length = 512]
        name -> Varchar,
        /// Latest outcome.
        #[max_length = 50]
        status -> Varchar,
        /// Latest outcome detail.
        message -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        modified_at -> Timestamptz,
    }
}

diesel::joinable!(tasks -> registries (registry_id));
diesel::joinable!(images -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, agents, registries, images);
