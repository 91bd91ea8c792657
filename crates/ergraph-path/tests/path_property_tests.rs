use ergraph_path::{eval, parse_path, Environment, Path, PathSet};
use proptest::prelude::*;

fn ident() -> impl Strategy<Value = String> {
    // Keep identifiers small and readable (and compatible with the path lexer).
    proptest::string::string_regex("[A-Za-z_][A-Za-z0-9_]{0,8}").unwrap()
}

fn atom() -> impl Strategy<Value = Path> {
    prop_oneof![
        4 => ident().prop_map(Path::term),
        1 => Just(Path::absolute()),
        1 => proptest::string::string_regex("[a-z ]{0,6}")
            .unwrap()
            .prop_map(Path::value),
    ]
}

fn path() -> impl Strategy<Value = Path> {
    atom().prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Path::inverse),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Path::join(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Path::intersection(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| Path::union(l, r)),
        ]
    })
}

/// Routes over a toy universe: every name `n` goes from `n` to `n'`.
#[derive(Debug, Clone, PartialEq)]
struct Routes(Vec<(String, String)>);

impl PathSet for Routes {
    type Error = ();

    fn inverse(self) -> Self {
        Routes(self.0.into_iter().map(|(s, t)| (t, s)).collect())
    }

    fn join(self, right: Self) -> Result<Self, ()> {
        let mut out = Vec::new();
        for (ls, lt) in &self.0 {
            for (rs, rt) in &right.0 {
                if lt == rs {
                    out.push((ls.clone(), rt.clone()));
                }
            }
        }
        Ok(Routes(out))
    }

    fn intersection(self, right: Self) -> Result<Self, ()> {
        Ok(Routes(
            self.0.into_iter().filter(|r| right.0.contains(r)).collect(),
        ))
    }

    fn union(mut self, right: Self) -> Result<Self, ()> {
        self.0.extend(right.0);
        Ok(self)
    }
}

struct Universe;

impl Environment for Universe {
    type Set = Routes;

    fn lookup(&self, name: &str) -> Result<Routes, ()> {
        Ok(Routes(vec![(name.to_string(), format!("{name}'"))]))
    }

    fn wrap(&self, literal: &str) -> Result<Routes, ()> {
        Ok(Routes(vec![("*".to_string(), format!("'{literal}'"))]))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn canonical_display_parses_back(p in path()) {
        let text = p.to_string();
        let parsed = parse_path(&text).expect("canonical text should parse");
        prop_assert_eq!(parsed, p);
    }

    #[test]
    fn double_inverse_preserves_routes(p in path()) {
        let once = eval(&p, &Universe).unwrap();
        let twice = eval(&Path::inverse(Path::inverse(p)), &Universe).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn inverse_swaps_every_route(name in ident()) {
        let routes = eval(&Path::inverse(Path::term(name.clone())), &Universe).unwrap();
        prop_assert_eq!(routes, Routes(vec![(format!("{name}'"), name)]));
    }
}
