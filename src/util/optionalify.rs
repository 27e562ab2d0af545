//! Derive template which makes an all-optional twin of a configuration struct
// (c) 2026 Ferry contributors

#![allow(meta_variable_misuse)] // false positives in these macro definitions

use derive_deftly::define_derive_deftly;

define_derive_deftly! {
    /// Creates `{OriginalName}_Optional`, a copy of a struct with every field wrapped in `Option`.
    ///
    /// The copy keeps every attribute that appears *after* `#[derive_deftly(Optionalify)]`,
    /// so one set of `clap` and `serde` annotations serves both structs.
    /// It also implements [`figment::Provider`](https://docs.rs/figment/latest/figment/trait.Provider.html),
    /// contributing only the fields which are `Some`. This makes it suitable as the top layer of
    /// a configuration stack, fed from the command line.
    ///
    /// If the original struct already derives `Default`, add `#[deftly(already_has_default)]`.
    ///
    /// ### Example
    ///
    /// ```
    /// use derive_deftly::Deftly;
    /// use ferry::derive_deftly_template_Optionalify;
    /// #[derive(Deftly)]
    /// #[derive_deftly(Optionalify)]
    /// #[derive(Debug, Clone, serde::Serialize)]
    /// struct Settings {
    ///     port: u16,
    /// }
    /// let cli = Settings_Optional { port: Some(1234) };
    /// assert_eq!(cli.port, Some(1234));
    /// ```
    export Optionalify for struct, expect items:
    ${define OPTIONAL_TYPE ${paste $tdeftype _Optional}}

    /// Auto-derived struct variant with fields wrapped as `Option<...>`
    ///
    #[allow(non_camel_case_types)]
    ${tattrs}
    ${if not(tmeta(already_has_default)){
        #[derive(Default)]
    }}
    ${tvis} struct $OPTIONAL_TYPE {
        $(
            ${fattrs}
            ${fvis} $fname: Option<$ftype>,
        )
    }

    impl figment::Provider for $OPTIONAL_TYPE {
        fn metadata(&self) -> figment::Metadata {
            figment::Metadata::named("command-line").interpolater(|_profile, path| {
                use heck::ToKebabCase;
                let key = path.last().map_or("<unknown>".to_string(), |s| s.to_kebab_case());
                format!("--{key}")
            })
        }

        fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
            use figment::{Profile, value::{Dict, Map, Value}};
            let mut dict = Dict::new();
            $(
                if let Some(inner) = &self.${fname} {
                    let _ = dict.insert(stringify!($fname).to_string(), Value::serialize(inner)?);
                }
            )
            let mut profile_map = Map::new();
            let _ = profile_map.insert(Profile::Global, dict);
            Ok(profile_map)
        }
    }
}

#[allow(clippy::module_name_repetitions)]
pub use derive_deftly_template_Optionalify;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use super::derive_deftly_template_Optionalify;
    use derive_deftly::Deftly;
    use figment::{providers::Serialized, Figment, Provider as _};
    use pretty_assertions::assert_eq;

    #[derive(Deftly)]
    #[derive_deftly(Optionalify)]
    #[deftly(already_has_default)]
    #[derive(PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
    struct Knobs {
        port: u16,
        host: String,
        retries: Option<u32>,
    }

    #[test]
    fn only_given_fields_override() {
        let entered = Knobs_Optional {
            port: Some(9000),
            ..Default::default()
        };
        let merged: Knobs = Figment::new()
            .merge(Serialized::defaults(Knobs {
                port: 1,
                host: "somewhere".into(),
                retries: None,
            }))
            .merge(entered)
            .extract()
            .unwrap();
        assert_eq!(
            merged,
            Knobs {
                port: 9000,
                host: "somewhere".into(),
                retries: None,
            }
        );
    }

    #[test]
    fn metadata_names_the_flag() {
        let entered = Knobs_Optional::default();
        let md = entered.metadata();
        assert_eq!(md.name, "command-line");
        let key = ["max_retries".to_string()];
        let interp = md.interpolate(&figment::Profile::Global, &key);
        assert_eq!(interp, "--max-retries");
    }
}
