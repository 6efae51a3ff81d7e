//! Macros for reducing boilerplate when defining entities

/// Implement [`Entity`](crate::core::entity::Entity) for a record struct.
///
/// The struct must have `id: Uuid`, `created_at: DateTime<Utc>` and
/// `updated_at: DateTime<Utc>` fields. Optional entries override the trait
/// defaults and must appear in the order shown.
///
/// # Example
/// ```rust,ignore
/// impl_entity!(Property {
///     singular: "property",
///     plural: "properties",
///     display: "property",
///     text_index: ["title", "description"],
///     unique: ["slug"],
///     active_flag: "isActive",
///     sort: SortOrder::new().descending("isFeatured").descending("createdAt"),
/// });
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($type:ident {
        singular: $singular:literal,
        plural: $plural:literal,
        display: $display:literal
        $(, text_index: [$($text:literal),* $(,)?])?
        $(, unique: [$($unique:literal),* $(,)?])?
        $(, active_flag: $flag:literal)?
        $(, sort: $sort:expr)?
        $(,)?
    }) => {
        impl $crate::core::entity::Entity for $type {
            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $singular
            }

            fn display_name() -> &'static str {
                $display
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            $(
                fn text_index_fields() -> &'static [&'static str] {
                    &[$($text),*]
                }
            )?

            $(
                fn unique_fields() -> &'static [&'static str] {
                    &[$($unique),*]
                }
            )?

            $(
                fn active_flag() -> Option<&'static str> {
                    Some($flag)
                }
            )?

            $(
                fn default_sort() -> $crate::core::query::SortOrder {
                    $sort
                }
            )?
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::entity::Entity;
    use crate::core::query::SortOrder;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Plain {
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Full {
        id: Uuid,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl_entity!(Plain {
        singular: "plain",
        plural: "plains",
        display: "plain record",
    });

    impl_entity!(Full {
        singular: "full",
        plural: "fulls",
        display: "full record",
        text_index: ["name", "notes"],
        unique: ["code"],
        active_flag: "isActive",
        sort: SortOrder::new().ascending("name"),
    });

    #[test]
    fn test_defaults_are_kept_when_omitted() {
        assert_eq!(Plain::resource_name(), "plains");
        assert_eq!(Plain::display_name(), "plain record");
        assert!(Plain::text_index_fields().is_empty());
        assert!(Plain::unique_fields().is_empty());
        assert_eq!(Plain::active_flag(), None);
        assert_eq!(Plain::default_sort(), SortOrder::newest_first());
    }

    #[test]
    fn test_overrides_are_generated() {
        assert_eq!(Full::resource_name_singular(), "full");
        assert_eq!(Full::text_index_fields(), &["name", "notes"]);
        assert_eq!(Full::unique_fields(), &["code"]);
        assert_eq!(Full::active_flag(), Some("isActive"));
        assert_eq!(Full::default_sort(), SortOrder::new().ascending("name"));
    }
}
