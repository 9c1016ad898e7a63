// Signing & verification benchmarks.
//
// Covers secp256k1 key generation, domain-tagged signing and verification
// with both hash algorithms, DER normalization, and full multi-party
// signature collection at various authorizer counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use flow_transaction::config::TransactionConfig;
use flow_transaction::crypto::{normalize_signature, EcdsaSigner, HashAlgorithm, Signer};
use flow_transaction::transaction::{Transaction, TransactionBuilder};
use flow_transaction::Address;

fn bench_key_generation(c: &mut Criterion) {
    c.bench_function("secp256k1/key_generate", |b| {
        b.iter(|| EcdsaSigner::generate(HashAlgorithm::Sha3_256));
    });
}

fn bench_sign_message(c: &mut Criterion) {
    let message = b"transaction { execute { log(\"Hello, World!\") } }";
    let mut group = c.benchmark_group("secp256k1/sign_as_transaction");

    for hash in [HashAlgorithm::Sha2_256, HashAlgorithm::Sha3_256] {
        let signer = EcdsaSigner::generate(hash);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{hash:?}")), &signer, |b, s| {
            b.iter(|| s.sign_as_transaction(message).unwrap());
        });
    }

    group.finish();
}

fn bench_verify_signature(c: &mut Criterion) {
    let signer = EcdsaSigner::generate(HashAlgorithm::Sha3_256);
    let message = b"transaction { execute { log(\"Hello, World!\") } }";
    let signature = signer.sign_as_transaction(message).unwrap();
    let public_key = signer.public_key();

    c.bench_function("secp256k1/verify_transaction", |b| {
        b.iter(|| public_key.verify_transaction(message, &signature).unwrap());
    });
}

fn bench_normalize(c: &mut Criterion) {
    // r and s both need a DER sign byte.
    let mut der = vec![0x30, 0x44, 0x02, 0x21, 0x00];
    der.extend_from_slice(&[0x80; 32]);
    der.extend_from_slice(&[0x02, 0x21, 0x00]);
    der.extend_from_slice(&[0x81; 32]);

    c.bench_function("der/normalize_signature", |b| {
        b.iter(|| normalize_signature(&der, 32).unwrap());
    });
}

fn multi_party_tx(authorizers: u8) -> Transaction {
    let builder = TransactionBuilder::new(&TransactionConfig::default())
        .script("transaction { prepare(signer: &Account) {} }")
        .reference_block_id_hex("01")
        .proposal_key(Address::from_slice(&[1]).unwrap(), 0, 1)
        .payer(Address::from_slice(&[0xff]).unwrap());
    (0..authorizers)
        .fold(builder, |b, i| b.authorizer(Address::from_slice(&[0x10, i]).unwrap()))
        .build()
        .unwrap()
}

fn bench_collect_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction/collect_signatures");
    let key = EcdsaSigner::generate(HashAlgorithm::Sha3_256);

    for authorizers in [1u8, 4, 16] {
        let tx = multi_party_tx(authorizers);
        group.throughput(Throughput::Elements(tx.signer_list().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(authorizers), &tx, |b, tx| {
            b.iter(|| {
                let signed = tx
                    .signer_list()
                    .into_iter()
                    .filter(|a| *a != tx.payer())
                    .try_fold(tx.clone(), |tx, a| tx.sign_payload(a, 0, &key))
                    .unwrap();
                signed.sign_envelope(tx.payer(), 0, &key).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_key_generation,
    bench_sign_message,
    bench_verify_signature,
    bench_normalize,
    bench_collect_signatures,
);
criterion_main!(benches);
