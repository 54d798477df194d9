/// Issue a policy key for each flat `n`-of-`n` policy in `$sizes` along with an attribute key
/// exactly satisfying it
#[macro_export]
macro_rules! setup_cp_abs {
    ($group: ty, $rng: ident, $sizes: ident, $params: ident, $universe: ident, $policies_range: ident, $attributes_range: ident, $policy_keys_range: ident, $attribute_keys_range: ident) => {
        // Hardcoding policy sizes. This should ideally be taken/updated from command line input
        let $sizes = [2, 4, 8, 16, 32, 64];
        let $params = SystemParams::<$group>::new(&mut $rng);
        let $universe = AttributeUniverse::<$group>::new();
        let ($policies_range, $attributes_range): (Vec<_>, Vec<_>) = $sizes
            .iter()
            .map(|n| test_utils::policies::flat_policy(*n, *n))
            .unzip();
        let $policy_keys_range = $policies_range
            .iter()
            .map(|p| PolicyKey::generate(&mut $rng, &$params, &$universe, p).unwrap())
            .collect::<Vec<_>>();
        let $attribute_keys_range = $attributes_range
            .iter()
            .map(|a| AttributeKey::extract(&mut $rng, &$params, &$universe, a).unwrap())
            .collect::<Vec<_>>();
    };
}
