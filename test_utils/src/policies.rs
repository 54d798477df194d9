//! Policies with attribute sets that do and don't satisfy them

/// `(policy, attributes, satisfied)`
pub type Case = (&'static str, &'static [&'static str], bool);

pub const CASES: &[Case] = &[
    ("{a,b,c,d,[4,4]}", &["a", "b", "c", "d"], true),
    ("{a,b,c,d,[4,4]}", &["a", "b", "c"], false),
    ("{a,b,[2,1]}", &["a"], true),
    ("{a,b,[2,1]}", &["b", "c"], true),
    ("{a,b,[2,1]}", &["c"], false),
    ("admin", &["admin"], true),
    ("admin", &["user"], false),
    ("{a,{b,c,[2,1]},{d,{e,f,[2,2]},[2,1]},[3,2]}", &["a", "b"], true),
    ("{a,{b,c,[2,1]},{d,{e,f,[2,2]},[2,1]},[3,2]}", &["c", "e", "f"], true),
    ("{a,{b,c,[2,1]},{d,{e,f,[2,2]},[2,1]},[3,2]}", &["a", "e"], false),
    (
        "{ doctor , { cardiology, surgery, [2, 1] }, { senior, on-call, [2, 2] }, [3, 2] }",
        &["doctor", "senior", "on-call"],
        true,
    ),
    (
        "{ doctor , { cardiology, surgery, [2, 1] }, { senior, on-call, [2, 2] }, [3, 2] }",
        &["doctor", "senior"],
        false,
    ),
];

/// Malformed policies
pub const INVALID: &[&str] = &[
    "",
    "{}",
    "{a,b,[2,3]}",
    "{a,b,[2,0]}",
    "{a,b,[3,1]}",
    "{a,b,[2,1]",
    "{a,b,[2,1}",
    "{a,b}",
    "{a,a,[2,1]}",
    "{a,,[2,1]}",
];

/// Flat `t`-of-`n` gate over attributes `attr0..attr{n-1}` and those attributes
pub fn flat_policy(n: usize, t: usize) -> (String, Vec<String>) {
    let attributes = (0..n).map(|i| format!("attr{}", i)).collect::<Vec<_>>();
    let policy = format!("{{{},[{},{}]}}", attributes.join(","), n, t);
    (policy, attributes)
}

/// Complete tree of the given `depth` where every gate is `t`-of-`n`, and all its attributes
pub fn nested_policy(depth: usize, n: usize, t: usize) -> (String, Vec<String>) {
    let mut attributes = Vec::new();
    let policy = nested(depth, n, t, &mut attributes);
    (policy, attributes)
}

fn nested(depth: usize, n: usize, t: usize, attributes: &mut Vec<String>) -> String {
    if depth == 0 {
        let name = format!("attr{}", attributes.len());
        attributes.push(name.clone());
        return name;
    }
    let children = (0..n)
        .map(|_| nested(depth - 1, n, t, attributes))
        .collect::<Vec<_>>();
    format!("{{{},[{},{}]}}", children.join(","), n, t)
}
