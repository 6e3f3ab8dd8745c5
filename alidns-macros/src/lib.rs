use std::fmt;

/// Raised by [`extract_params!`] when a required builder field was never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingParam(pub &'static str);

impl fmt::Display for MissingParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is required", self.0)
    }
}

impl std::error::Error for MissingParam {}

#[macro_export]
/// The `extract_params!` macro pulls fields out of a record operation builder and
/// generates a request parameter struct holding those values.
///
/// This macro supports:
/// - Required fields, which fail with [`MissingParam`] when unset
/// - Optional fields, which stay `None` and are left out of the query
/// - Renaming each field to the API parameter name used on the wire
///
/// The generated struct exposes `query_pairs()`, returning `(api_name, value)`
/// pairs in declaration order.
///
/// # Usage
///
/// ```rust,ignore
/// let params = extract_params!(builder, StructName, {
///     required field1: String => "Field1",
///     optional field2: u32 => "Field2"
/// });
/// ```
///
/// The enclosing function must return a `Result` whose error type implements
/// `From<MissingParam>`.
macro_rules! extract_params {
    (@extract_required $builder:expr, $field:ident) => {
        $builder
            .$field
            .clone()
            .ok_or($crate::MissingParam(stringify!($field)))?
    };

    (@extract_optional $builder:expr, $field:ident) => {
        $builder.$field.clone()
    };

    (
        $builder:expr,
        $struct_name:ident,
        {
            $( required $req_field:ident : $req_ty:ty => $req_key:literal ),* $(,)*
            $( optional $opt_field:ident : $opt_ty:ty => $opt_key:literal ),* $(,)*
        }
    ) => {{
        #[derive(Debug)]
        struct $struct_name {
            $( $req_field: $req_ty, )*
            $( $opt_field: Option<$opt_ty>, )*
        }

        impl $struct_name {
            #[allow(dead_code)]
            fn query_pairs(&self) -> Vec<(&'static str, String)> {
                #[allow(unused_mut)]
                let mut pairs = Vec::new();
                $( pairs.push(($req_key, self.$req_field.to_string())); )*
                $(
                    if let Some(value) = &self.$opt_field {
                        pairs.push(($opt_key, value.to_string()));
                    }
                )*
                pairs
            }
        }

        $struct_name {
            $( $req_field: $crate::extract_params!(@extract_required $builder, $req_field), )*
            $( $opt_field: $crate::extract_params!(@extract_optional $builder, $opt_field), )*
        }
    }};
}
