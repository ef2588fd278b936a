#[cfg(test)]
pub mod test {
    use std::fmt;

    use crate::error::FlagError;
    use crate::flag::{
        BoolFlag, DurationFlag, Float64Flag, GenericFlag, IntFlag, IntSliceFlag, StringSliceFlag,
        TimestampFlag,
    };
    use crate::flagset::FlagSet;
    use crate::value::{
        BoolValue, DurationValue, FlagValue, Float64Value, IntSlice, IntValue, StringSlice,
        Timestamp,
    };

    /// One flag of every built-in kind, shared by the merge tests. `test` and
    /// `top.test` default to 7, `test` also reads `THE_TEST`.
    pub fn test_flags() -> FlagSet {
        FlagSet::new()
            .with(IntFlag::new("test", IntValue::new(7)).env("THE_TEST"))
            .with(IntFlag::new("top.test", IntValue::new(7)))
            .with(DurationFlag::new("timeout", DurationValue::default()))
            .with(StringSliceFlag::new("tags", StringSlice::default()))
            .with(IntSliceFlag::new("ids", IntSlice::new([1])))
            .with(BoolFlag::new("verbose", BoolValue::default()))
            .with(Float64Flag::new("ratio", Float64Value::new(0.5)))
            .with(TimestampFlag::new("since", Timestamp::default()))
    }

    // -- Fixture for user-defined value types -----------------------------------

    /// A temperature written as `21.5C`.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Celsius(pub f64);

    impl fmt::Display for Celsius {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}C", self.0)
        }
    }

    impl FlagValue for Celsius {
        fn set(&mut self, raw: &str) -> Result<(), FlagError> {
            let degrees = raw
                .strip_suffix('C')
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| FlagError::Parse {
                    kind: "celsius",
                    raw: raw.to_string(),
                    reason: "expected a number followed by C".into(),
                })?;
            self.0 = degrees;
            Ok(())
        }
    }

    pub type CelsiusFlag = GenericFlag<Celsius>;

    #[test]
    fn celsius_flag_goes_through_every_layer() {
        use crate::env::MapEnv;
        use crate::merge::apply_input_source;
        use crate::source::MapSource;

        let mut flags = FlagSet::new().with(CelsiusFlag::new("temp", Celsius(20.0)).env("TEMP"));
        apply_input_source(&mut flags, &MapSource::empty().with("temp", "18.5C")).unwrap();
        assert_eq!(flags.value::<Celsius>("temp"), Some(&Celsius(18.5)));

        flags.reset();
        flags.apply(&MapEnv::new().with_var("TEMP", "30C")).unwrap();
        flags.parse(["--temp", "25C"]).unwrap();
        assert_eq!(flags.value::<Celsius>("temp"), Some(&Celsius(25.0)));
        assert!(flags.parse(["--temp", "hot"]).is_err());
    }
}
