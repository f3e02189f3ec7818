// Bail out of a validation function with `Error::BadParts`.
macro_rules! ensure {
    ($cond:expr, $($fmt:tt)+) => {
        if !$cond {
            return Err($crate::Error::BadParts(format!($($fmt)+)));
        }
    };
}

// Run `validate` always, or only in debug builds.
//
// Construction paths that already uphold the invariants by construction use
// the `debug` form; anything built from caller-supplied parts uses `always`.
macro_rules! validate_csr {
    (always, $csr:expr) => {{
        let csr = $csr;
        csr.validate()?;
        csr
    }};
    (debug, $csr:expr) => {{
        let csr = $csr;
        if cfg!(debug_assertions) {
            if let Err(e) = csr.validate() {
                panic!("internal invariant violated: {}", e);
            }
        }
        csr
    }};
}
