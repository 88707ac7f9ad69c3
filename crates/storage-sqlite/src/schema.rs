// Mirrors migrations/. Keep in sync when adding a migration.

diesel::table! {
    users (id) {
        id -> BigInt,
        phone -> Text,
        name -> Text,
        email -> Nullable<Text>,
        role -> Text,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    properties (id) {
        id -> BigInt,
        user_id -> BigInt,
        name -> Text,
        address -> Text,
        unit -> Nullable<Text>,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    work_orders (id) {
        id -> BigInt,
        property_id -> BigInt,
        assigned_to -> Nullable<BigInt>,
        title -> Text,
        description -> Nullable<Text>,
        status -> Text,
        priority -> Text,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    payments (id) {
        id -> BigInt,
        property_id -> BigInt,
        user_id -> BigInt,
        amount -> Text,
        currency -> Text,
        due_date -> Date,
        paid_at -> Nullable<Timestamp>,
        status -> Text,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    notifications (id) {
        id -> BigInt,
        user_id -> BigInt,
        property_id -> Nullable<BigInt>,
        title -> Text,
        body -> Text,
        is_read -> Bool,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    doors (id) {
        id -> BigInt,
        property_id -> BigInt,
        name -> Text,
        lock_identifier -> Text,
        is_locked -> Bool,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    unlock_events (id) {
        id -> BigInt,
        door_id -> BigInt,
        user_id -> BigInt,
        method -> Text,
        unlocked_at -> Timestamp,
        sync_status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(properties -> users (user_id));
diesel::joinable!(work_orders -> properties (property_id));
diesel::joinable!(payments -> properties (property_id));
diesel::joinable!(doors -> properties (property_id));
diesel::joinable!(unlock_events -> doors (door_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    properties,
    work_orders,
    payments,
    notifications,
    doors,
    unlock_events,
);
