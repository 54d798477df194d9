use ark_std::rand::{rngs::StdRng, SeedableRng};
use benches::setup_cp_abs;
use cp_abs::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const MESSAGE: &[u8] = b"DogContract.GetDog";

macro_rules! bench_curve {
    ($fn_name: ident, $group: ty, $label: expr) => {
        fn $fn_name(c: &mut Criterion) {
            let mut rng = StdRng::seed_from_u64(0u64);

            setup_cp_abs!(
                $group,
                rng,
                sizes,
                params,
                universe,
                policies_range,
                attributes_range,
                policy_keys_range,
                attribute_keys_range
            );

            let mut keygen_group = c.benchmark_group(format!("{} policy key generation", $label));
            for (i, n) in sizes.iter().enumerate() {
                keygen_group.bench_with_input(BenchmarkId::from_parameter(*n), &i, |b, &i| {
                    b.iter(|| {
                        PolicyKey::generate(
                            &mut rng,
                            black_box(&params),
                            black_box(&universe),
                            black_box(&policies_range[i]),
                        )
                        .unwrap()
                    });
                });
            }
            keygen_group.finish();

            let mut extract_group =
                c.benchmark_group(format!("{} attribute key extraction", $label));
            for (i, n) in sizes.iter().enumerate() {
                extract_group.bench_with_input(BenchmarkId::from_parameter(*n), &i, |b, &i| {
                    b.iter(|| {
                        AttributeKey::extract(
                            &mut rng,
                            black_box(&params),
                            black_box(&universe),
                            black_box(&attributes_range[i]),
                        )
                        .unwrap()
                    });
                });
            }
            extract_group.finish();

            let mut sign_group = c.benchmark_group(format!("{} signing", $label));
            sign_group.bench_function("sign", |b| {
                b.iter(|| {
                    Signature::<$group>::new(
                        &mut rng,
                        black_box(MESSAGE),
                        black_box(&attribute_keys_range[0].secret_key),
                    )
                });
            });
            sign_group.finish();

            let sigs_range = attribute_keys_range
                .iter()
                .map(|k| Signature::<$group>::new(&mut rng, MESSAGE, &k.secret_key))
                .collect::<Vec<_>>();

            let mut verify_group = c.benchmark_group(format!("{} verifying", $label));
            for (i, n) in sizes.iter().enumerate() {
                verify_group.bench_with_input(BenchmarkId::from_parameter(*n), &i, |b, &i| {
                    b.iter(|| {
                        assert!(verify(
                            &universe,
                            black_box(&attribute_keys_range[i].public_key),
                            black_box(&policy_keys_range[i]),
                            black_box(MESSAGE),
                            black_box(&sigs_range[i]),
                        ))
                    });
                });
            }
            verify_group.finish();
        }
    };
}

bench_curve!(p256_benchmark, ark_secp256r1::Affine, "P-256");
bench_curve!(p384_benchmark, ark_secp384r1::Affine, "P-384");

criterion_group!(benches, p256_benchmark, p384_benchmark);
criterion_main!(benches);
