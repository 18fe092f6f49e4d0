//! Helper macro for declaring port and lookup error enums.
//!
//! Every variant carries named fields and a display format. Each variant also
//! gets a snake_case constructor whose arguments accept anything convertible
//! into the field types, so call sites read `Error::upstream(429_u16, body)`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field: $ty),* },
            )*
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!(
                        "Build [`", stringify!($name), "::", stringify!($variant), "`]."
                    )]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                        Self::$variant { $($field: $field.into()),* }
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SearchError {
            Throttled { wait_secs: u64 } => "throttled for {wait_secs}s",
            Rejected { status: u16, body: String } => "rejected with {status}: {body}",
        }
    }

    #[test]
    fn constructors_convert_into_field_types() {
        let error = SearchError::rejected(403_u16, "forbidden");
        assert_eq!(
            error,
            SearchError::Rejected {
                status: 403,
                body: "forbidden".to_owned(),
            }
        );
    }

    #[test]
    fn display_uses_the_declared_format() {
        assert_eq!(SearchError::throttled(7_u64).to_string(), "throttled for 7s");
    }
}
