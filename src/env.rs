// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Utilities to deal with environment variables.

use std::env;

/// Result type for environment errors.
type Result<T> = std::result::Result<T, String>;

/// Wrapper around an environment variable's value to support conversions to other types.
pub struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Ok(value.0)
    }
}

/// Generates a `TryFrom<Value>` for a type that can be parsed by `FromStr`.
macro_rules! tryfrom_value_for_fromstr [
    ( $t:ty ) => {
        impl TryFrom<Value> for $t {
            type Error = String;

            fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
                value.0.parse::<$t>().map_err(|e| format!("Invalid {}: {}", stringify!($t), e))
            }
        }
    }
];

tryfrom_value_for_fromstr!(u16);
tryfrom_value_for_fromstr!(u32);

/// Gets a required environment variable whose name is `<prefix>_<suffix>` with a conversion to
/// a target type `T`.
pub fn get_required_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<T> {
    let name = format!("{}_{}", prefix, suffix);
    match env::var(&name) {
        Ok(value) => match Value(value).try_into() {
            Ok(value) => Ok(value),
            Err(e) => Err(format!("Invalid type in environment variable {}: {}", name, e)),
        },
        Err(env::VarError::NotPresent) => {
            Err(format!("Required environment variable {} not present", name))
        }
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}

/// Gets an optional environment variable whose name is `<prefix>_<suffix>` with a conversion to
/// a target type `T`.  An unset variable yields `None`, not an error.
pub fn get_optional_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<Option<T>> {
    let name = format!("{}_{}", prefix, suffix);
    match env::var(&name) {
        Ok(value) => match Value(value).try_into() {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(format!("Invalid type in environment variable {}: {}", name, e)),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}
