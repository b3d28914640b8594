//! Test yardımcıları: sabit yanıtlı ağ istemcisi, depo/doğrulayıcı
//! kurulumları ve attestation zinciri üreticileri.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ciborium::Value;
use p256::ecdsa::signature::Signer as _;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CustomExtension, DnType, IsCa, KeyPair,
};
use sha2::{Digest, Sha256};
use time::macros::datetime;
use time::OffsetDateTime;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer as _;

use ostiary_x509::{key_fingerprint, TrustAnchors};

use crate::attestation::AttestationObject;
use crate::challenge::{Challenge, ChallengeStatus, ChallengeType, ChallengeValidator, InsecurePorts};
use crate::client::{ClientError, HttpResponse, TlsDialConfig, TlsProbe, ValidationClient};
use crate::clock::FixedClock;
use crate::jwk::AccountJwk;
use crate::provisioner::{AttestationFormat, StaticProvisioner};
use crate::store::{AuthorizationRecord, MemoryChallengeStore};
use crate::validation::ValidationContext;

/// Testlerin sabitlediği doğrulama anı.
pub(crate) const FIXED_VALIDATION_TIME: OffsetDateTime = datetime!(2024-05-01 12:30:45 UTC);

/// RFC 7517 örnek P-256 anahtarı; thumbprint'i deterministiktir.
pub(crate) fn test_jwk() -> AccountJwk {
    AccountJwk::ec(
        "P-256",
        "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
        "4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
    )
}

/// `pending` durumda bir challenge üretir.
pub(crate) fn pending_challenge(kind: ChallengeType, value: &str, token: &str) -> Challenge {
    Challenge {
        id: "ch-1".to_owned(),
        account_id: "acct-1".to_owned(),
        authorization_id: "az-1".to_owned(),
        value: value.to_owned(),
        kind,
        status: ChallengeStatus::Pending,
        token: token.to_owned(),
        validated_at: None,
        url: "https://ca.invalid/acme/challenge/ch-1".to_owned(),
        error: None,
    }
}

/// Sabit yanıtlar döndüren [`ValidationClient`]; yapılandırılmamış bir
/// operasyon çağrılırsa panikler.
#[derive(Default)]
pub(crate) struct StaticClient {
    pub http: Option<Result<HttpResponse, ClientError>>,
    pub tls: Option<Result<TlsProbe, ClientError>>,
    pub txt: Option<Result<Vec<String>, ClientError>>,
    pub expected_url: Option<String>,
    pub expected_host_port: Option<String>,
    pub expected_server_name: Option<String>,
    pub expected_txt_name: Option<String>,
}

#[async_trait]
impl ValidationClient for StaticClient {
    async fn http_get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        if let Some(expected) = &self.expected_url {
            assert_eq!(url, expected, "beklenmeyen http-01 URL'i");
        }
        self.http.clone().expect("beklenmeyen http_get çağrısı")
    }

    async fn tls_dial(
        &self,
        host_port: &str,
        config: &TlsDialConfig,
    ) -> Result<TlsProbe, ClientError> {
        if let Some(expected) = &self.expected_host_port {
            assert_eq!(host_port, expected, "beklenmeyen tls hedefi");
        }
        if let Some(expected) = &self.expected_server_name {
            assert_eq!(&config.server_name, expected, "beklenmeyen SNI");
        }
        assert_eq!(
            config.alpn_protocols,
            vec!["acme-tls/1".to_owned()],
            "ALPN listesi acme-tls/1 olmalı"
        );
        self.tls.clone().expect("beklenmeyen tls_dial çağrısı")
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ClientError> {
        if let Some(expected) = &self.expected_txt_name {
            assert_eq!(name, expected, "beklenmeyen TXT sorgusu");
        }
        self.txt.clone().expect("beklenmeyen lookup_txt çağrısı")
    }
}

/// Depo ve sabit saatle bir doğrulayıcı kurar; tüm challenge'lar için
/// `az-1` authorization kaydı da eklenir.
pub(crate) fn make_validator(
    challenges: Vec<Challenge>,
    client: StaticClient,
) -> (ChallengeValidator, Arc<MemoryChallengeStore>) {
    make_attestation_validator(challenges, client, [], None)
}

/// Attestation formatları ve kökleri yapılandırılmış doğrulayıcı kurar.
pub(crate) fn make_attestation_validator(
    challenges: Vec<Challenge>,
    client: StaticClient,
    formats: impl IntoIterator<Item = AttestationFormat>,
    roots: Option<TrustAnchors>,
) -> (ChallengeValidator, Arc<MemoryChallengeStore>) {
    let store = Arc::new(MemoryChallengeStore::new());
    store
        .insert_authorization(AuthorizationRecord::new("az-1"))
        .expect("authorization eklenmeli");
    for challenge in challenges {
        store.insert_challenge(challenge).expect("challenge eklenmeli");
    }
    let mut provisioner = StaticProvisioner::new(formats);
    if let Some(roots) = roots {
        provisioner = provisioner.with_attestation_roots(roots);
    }
    let store_dyn: Arc<dyn crate::store::ChallengeStore> = store.clone();
    let validator = ChallengeValidator::new(store_dyn, Arc::new(client), Arc::new(provisioner))
        .with_clock(Arc::new(FixedClock::new(FIXED_VALIDATION_TIME)));
    (validator, store)
}

/// Format doğrulayıcılarını birim test etmek için bağımlılık demeti.
pub(crate) struct ContextParts {
    store: MemoryChallengeStore,
    client: StaticClient,
    provisioner: StaticProvisioner,
    clock: FixedClock,
}

impl ContextParts {
    pub(crate) fn context(&self) -> ValidationContext<'_> {
        ValidationContext {
            store: &self.store,
            client: &self.client,
            provisioner: &self.provisioner,
            clock: &self.clock,
            ports: InsecurePorts::default(),
        }
    }
}

/// Verilen köklerle bağımlılık demeti kurar.
pub(crate) fn make_context_parts(roots: Option<TrustAnchors>) -> ContextParts {
    let mut provisioner = StaticProvisioner::new([
        AttestationFormat::Apple,
        AttestationFormat::Step,
        AttestationFormat::Tpm,
    ]);
    if let Some(roots) = roots {
        provisioner = provisioner.with_attestation_roots(roots);
    }
    ContextParts {
        store: MemoryChallengeStore::new(),
        client: StaticClient::default(),
        provisioner,
        clock: FixedClock::new(FIXED_VALIDATION_TIME),
    }
}

/// `{"attObj": base64url(cbor), "error": ""}` payload'ı üretir.
pub(crate) fn attestation_payload(att_obj: &Value) -> Vec<u8> {
    let mut encoded = Vec::new();
    ciborium::ser::into_writer(att_obj, &mut encoded).expect("CBOR kodlanmalı");
    serde_json::to_vec(&serde_json::json!({
        "attObj": URL_SAFE_NO_PAD.encode(encoded),
        "error": "",
    }))
    .expect("payload kodlanmalı")
}

fn attestation_root(common_name: &str) -> (Certificate, KeyPair) {
    let mut params = CertificateParams::new(Vec::new()).expect("parametreler oluşmalı");
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    let key = KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).expect("anahtar üretilmeli");
    let cert = params.self_signed(&key).expect("kök imzalanmalı");
    (cert, key)
}

fn signed_leaf(
    root: &(Certificate, KeyPair),
    extensions: Vec<CustomExtension>,
    alg: &'static rcgen::SignatureAlgorithm,
) -> (Vec<u8>, KeyPair) {
    let mut params = CertificateParams::new(Vec::new()).expect("parametreler oluşmalı");
    params
        .distinguished_name
        .push(DnType::CommonName, "attestation leaf");
    params.custom_extensions = extensions;
    let key = KeyPair::generate_for(alg).expect("anahtar üretilmeli");
    let cert = params
        .signed_by(&key, &root.0, &root.1)
        .expect("yaprak imzalanmalı");
    (cert.der().to_vec(), key)
}

fn spki_fingerprint_of(leaf_der: &[u8]) -> String {
    let (_, cert) = X509Certificate::from_der(leaf_der).expect("sertifika ayrıştırılmalı");
    key_fingerprint(cert.public_key().raw)
}

fn x5c_value(x5c: &[Vec<u8>]) -> Value {
    Value::Array(x5c.iter().map(|der| Value::Bytes(der.clone())).collect())
}

// --- Apple ---

/// Apple attestation test zinciri.
pub(crate) struct AppleChain {
    pub roots: TrustAnchors,
    pub leaf_fingerprint: String,
    att_stmt: Value,
}

#[derive(Default)]
pub(crate) struct AppleChainBuilder {
    udid: Option<String>,
    serial_number: Option<String>,
    sep_version: Option<String>,
    nonce: Option<Vec<u8>>,
    x5c_override: Option<Vec<Vec<u8>>>,
    malformed_statement: bool,
}

impl AppleChain {
    pub(crate) fn builder() -> AppleChainBuilder {
        AppleChainBuilder::default()
    }

    pub(crate) fn attestation_object(&self) -> Value {
        Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("apple".into())),
            (Value::Text("attStmt".into()), self.att_stmt.clone()),
        ])
    }

    pub(crate) fn attestation_object_decoded(&self) -> AttestationObject {
        AttestationObject {
            format: "apple".to_owned(),
            att_stmt: self.att_stmt.clone(),
        }
    }
}

impl AppleChainBuilder {
    pub(crate) fn udid(mut self, udid: &str) -> Self {
        self.udid = Some(udid.to_owned());
        self
    }

    pub(crate) fn serial_number(mut self, serial: &str) -> Self {
        self.serial_number = Some(serial.to_owned());
        self
    }

    pub(crate) fn sep_version(mut self, version: &str) -> Self {
        self.sep_version = Some(version.to_owned());
        self
    }

    pub(crate) fn nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Nonce'u `SHA256(token)` olarak ayarlar.
    pub(crate) fn nonce_for_token(mut self, token: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        self.nonce = Some(digest.to_vec());
        self
    }

    pub(crate) fn x5c_override(mut self, x5c: Vec<Vec<u8>>) -> Self {
        self.x5c_override = Some(x5c);
        self
    }

    pub(crate) fn malformed_statement(mut self) -> Self {
        self.malformed_statement = true;
        self
    }

    pub(crate) fn build(self) -> AppleChain {
        let root = attestation_root("Apple Test Attestation Root");
        let mut extensions = Vec::new();
        if let Some(serial) = &self.serial_number {
            extensions.push(CustomExtension::from_oid_content(
                &[1, 2, 840, 113_635, 100, 8, 9, 1],
                serial.as_bytes().to_vec(),
            ));
        }
        if let Some(udid) = &self.udid {
            extensions.push(CustomExtension::from_oid_content(
                &[1, 2, 840, 113_635, 100, 8, 9, 2],
                udid.as_bytes().to_vec(),
            ));
        }
        if let Some(version) = &self.sep_version {
            extensions.push(CustomExtension::from_oid_content(
                &[1, 2, 840, 113_635, 100, 8, 10, 2],
                version.as_bytes().to_vec(),
            ));
        }
        if let Some(nonce) = &self.nonce {
            extensions.push(CustomExtension::from_oid_content(
                &[1, 2, 840, 113_635, 100, 8, 11, 1],
                nonce.clone(),
            ));
        }
        let (leaf_der, _leaf_key) = signed_leaf(&root, extensions, &rcgen::PKCS_ECDSA_P256_SHA256);
        let x5c = self.x5c_override.unwrap_or_else(|| vec![leaf_der.clone()]);
        let att_stmt = if self.malformed_statement {
            Value::Map(vec![(Value::Text("x5c".into()), Value::Text("bogus".into()))])
        } else {
            Value::Map(vec![(Value::Text("x5c".into()), x5c_value(&x5c))])
        };
        AppleChain {
            roots: TrustAnchors::from_der_certs(vec![root.0.der().to_vec()])
                .expect("kök havuzu oluşmalı"),
            leaf_fingerprint: spki_fingerprint_of(&leaf_der),
            att_stmt,
        }
    }
}

// --- Step / YubiKey ---

/// Step (YubiKey PIV) attestation test zinciri.
pub(crate) struct StepChain {
    pub roots: TrustAnchors,
    pub leaf_fingerprint: String,
    att_stmt: Value,
}

pub(crate) struct StepChainBuilder {
    serial_number: Option<u64>,
    ed25519: bool,
    signed_message: Option<String>,
    raw_signature: bool,
}

impl StepChain {
    pub(crate) fn builder() -> StepChainBuilder {
        StepChainBuilder {
            serial_number: None,
            ed25519: false,
            signed_message: None,
            raw_signature: false,
        }
    }

    pub(crate) fn attestation_object_decoded(&self) -> AttestationObject {
        AttestationObject {
            format: "step".to_owned(),
            att_stmt: self.att_stmt.clone(),
        }
    }
}

impl StepChainBuilder {
    pub(crate) fn serial_number(mut self, serial: u64) -> Self {
        self.serial_number = Some(serial);
        self
    }

    pub(crate) fn ed25519(mut self) -> Self {
        self.ed25519 = true;
        self
    }

    /// İmzalanacak mesajı `key_authorization(token, jwk)` olarak ayarlar.
    pub(crate) fn sign_key_authorization(mut self, token: &str, jwk: &AccountJwk) -> Self {
        self.signed_message = Some(crate::validation::key_authorization(token, jwk));
        self
    }

    /// İmzayı CBOR byte-string sarmalamadan koyar.
    pub(crate) fn raw_signature(mut self) -> Self {
        self.raw_signature = true;
        self
    }

    pub(crate) fn build(self) -> StepChain {
        let root = attestation_root("Yubico Test PIV Root");
        let mut extensions = Vec::new();
        if let Some(serial) = self.serial_number {
            extensions.push(CustomExtension::from_oid_content(
                &[1, 3, 6, 1, 4, 1, 41_482, 3, 7],
                der_integer(serial),
            ));
        }
        let alg = if self.ed25519 {
            &rcgen::PKCS_ED25519
        } else {
            &rcgen::PKCS_ECDSA_P256_SHA256
        };
        let (leaf_der, leaf_key) = signed_leaf(&root, extensions, alg);

        let message = self.signed_message.expect("imzalanacak mesaj ayarlanmalı");
        let signature = if self.ed25519 {
            let signing_key =
                ed25519_dalek::pkcs8::DecodePrivateKey::from_pkcs8_der(&leaf_key.serialize_der());
            let signing_key: ed25519_dalek::SigningKey =
                signing_key.expect("Ed25519 anahtarı çözülmeli");
            ed25519_dalek::Signer::sign(&signing_key, message.as_bytes())
                .to_bytes()
                .to_vec()
        } else {
            let signing_key: p256::ecdsa::SigningKey =
                p256::pkcs8::DecodePrivateKey::from_pkcs8_der(&leaf_key.serialize_der())
                    .expect("P-256 anahtarı çözülmeli");
            let signature: p256::ecdsa::Signature = signing_key.sign(message.as_bytes());
            signature.to_der().as_bytes().to_vec()
        };
        let sig_field = if self.raw_signature {
            signature
        } else {
            let mut wrapped = Vec::new();
            ciborium::ser::into_writer(&Value::Bytes(signature), &mut wrapped)
                .expect("imza CBOR kodlanmalı");
            wrapped
        };

        let att_stmt = Value::Map(vec![
            (
                Value::Text("x5c".into()),
                x5c_value(std::slice::from_ref(&leaf_der)),
            ),
            (Value::Text("sig".into()), Value::Bytes(sig_field)),
        ]);
        StepChain {
            roots: TrustAnchors::from_der_certs(vec![root.0.der().to_vec()])
                .expect("kök havuzu oluşmalı"),
            leaf_fingerprint: spki_fingerprint_of(&leaf_der),
            att_stmt,
        }
    }
}

/// Negatif olmayan bir tamsayıyı DER INTEGER olarak kodlar.
fn der_integer(value: u64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 && bytes[1] & 0x80 == 0 {
        bytes.remove(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    let mut out = vec![0x02, u8::try_from(bytes.len()).expect("uzunluk sığmalı")];
    out.extend_from_slice(&bytes);
    out
}

// --- TPM ---

const TEST_TPM_ALG_SHA256: u16 = 0x000B;
const TEST_TPM_ALG_NULL: u16 = 0x0010;
const TEST_TPM_ALG_ECDSA: u16 = 0x0018;
const TEST_TPM_ALG_ECC: u16 = 0x0023;
const TEST_TPM_ECC_NIST_P256: u16 = 0x0003;
const TEST_TPM_GENERATED: u32 = 0xFF54_4347;
const TEST_TPM_ST_ATTEST_CERTIFY: u16 = 0x8017;

/// TPM attestation test zinciri: AK sertifikası + sertifikasyon yapıları.
pub(crate) struct TpmChain {
    pub roots: TrustAnchors,
    pub leaf_fingerprint: String,
    pub attested_key_fingerprint: String,
    att_stmt: Value,
}

pub(crate) struct TpmChainBuilder {
    extra_data: Vec<u8>,
    version: String,
    alg: i64,
    tamper_cert_info: bool,
    wrong_attested_name: bool,
}

impl TpmChain {
    pub(crate) fn builder() -> TpmChainBuilder {
        TpmChainBuilder {
            extra_data: vec![0u8; 32],
            version: "2.0".to_owned(),
            alg: -7,
            tamper_cert_info: false,
            wrong_attested_name: false,
        }
    }

    pub(crate) fn attestation_object(&self) -> Value {
        Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("tpm".into())),
            (Value::Text("attStmt".into()), self.att_stmt.clone()),
        ])
    }

    pub(crate) fn attestation_object_decoded(&self) -> AttestationObject {
        AttestationObject {
            format: "tpm".to_owned(),
            att_stmt: self.att_stmt.clone(),
        }
    }
}

impl TpmChainBuilder {
    pub(crate) fn extra_data(mut self, extra_data: Vec<u8>) -> Self {
        self.extra_data = extra_data;
        self
    }

    pub(crate) fn version(mut self, version: &str) -> Self {
        self.version = version.to_owned();
        self
    }

    pub(crate) fn alg(mut self, alg: i64) -> Self {
        self.alg = alg;
        self
    }

    pub(crate) fn tamper_cert_info(mut self) -> Self {
        self.tamper_cert_info = true;
        self
    }

    pub(crate) fn wrong_attested_name(mut self) -> Self {
        self.wrong_attested_name = true;
        self
    }

    pub(crate) fn build(self) -> TpmChain {
        let root = attestation_root("TPM Test Manufacturer Root");
        let (ak_leaf_der, ak_key) = signed_leaf(&root, Vec::new(), &rcgen::PKCS_ECDSA_P256_SHA256);
        let ak_signing_key: p256::ecdsa::SigningKey =
            p256::pkcs8::DecodePrivateKey::from_pkcs8_der(&ak_key.serialize_der())
                .expect("AK anahtarı çözülmeli");

        // Attest edilen anahtar AK'den bağımsız bir P-256 anahtarıdır.
        let attested_pair =
            KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).expect("anahtar üretilmeli");
        let attested_signing: p256::ecdsa::SigningKey =
            p256::pkcs8::DecodePrivateKey::from_pkcs8_der(&attested_pair.serialize_der())
                .expect("anahtar çözülmeli");
        let attested_verifying = attested_signing.verifying_key();
        let point = attested_verifying.to_encoded_point(false);
        let pub_area = encode_ecc_pub_area(
            point.x().expect("x koordinatı olmalı").as_ref(),
            point.y().expect("y koordinatı olmalı").as_ref(),
        );
        let attested_spki = p256::pkcs8::EncodePublicKey::to_public_key_der(attested_verifying)
            .expect("SPKI kodlanmalı");

        let attested_name = if self.wrong_attested_name {
            name_for(b"wrong")
        } else {
            name_for(&pub_area)
        };
        let cert_info = encode_cert_info(&self.extra_data, &attested_name);

        let signed_bytes = if self.tamper_cert_info {
            let mut tampered = cert_info.clone();
            tampered.push(0xFF);
            tampered
        } else {
            cert_info.clone()
        };
        let signature: p256::ecdsa::Signature = ak_signing_key.sign(&signed_bytes);
        let (r, s) = signature.split_bytes();
        let mut sig = Vec::new();
        sig.extend_from_slice(&TEST_TPM_ALG_ECDSA.to_be_bytes());
        sig.extend_from_slice(&TEST_TPM_ALG_SHA256.to_be_bytes());
        sig.extend_from_slice(&tpm2b(r.as_ref()));
        sig.extend_from_slice(&tpm2b(s.as_ref()));

        let att_stmt = Value::Map(vec![
            (Value::Text("ver".into()), Value::Text(self.version)),
            (Value::Text("alg".into()), Value::Integer(self.alg.into())),
            (
                Value::Text("x5c".into()),
                x5c_value(std::slice::from_ref(&ak_leaf_der)),
            ),
            (Value::Text("sig".into()), Value::Bytes(sig)),
            (Value::Text("certInfo".into()), Value::Bytes(cert_info)),
            (Value::Text("pubArea".into()), Value::Bytes(pub_area)),
        ]);
        TpmChain {
            roots: TrustAnchors::from_der_certs(vec![root.0.der().to_vec()])
                .expect("kök havuzu oluşmalı"),
            leaf_fingerprint: spki_fingerprint_of(&ak_leaf_der),
            attested_key_fingerprint: key_fingerprint(attested_spki.as_bytes()),
            att_stmt,
        }
    }
}

fn tpm2b(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.extend_from_slice(&u16::try_from(bytes.len()).expect("uzunluk sığmalı").to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

fn name_for(pub_area: &[u8]) -> Vec<u8> {
    let digest: [u8; 32] = Sha256::digest(pub_area).into();
    let mut name = Vec::with_capacity(34);
    name.extend_from_slice(&TEST_TPM_ALG_SHA256.to_be_bytes());
    name.extend_from_slice(&digest);
    name
}

fn encode_ecc_pub_area(x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&TEST_TPM_ALG_ECC.to_be_bytes());
    out.extend_from_slice(&TEST_TPM_ALG_SHA256.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // objectAttributes
    out.extend_from_slice(&tpm2b(&[])); // authPolicy
    out.extend_from_slice(&TEST_TPM_ALG_NULL.to_be_bytes()); // symmetric
    out.extend_from_slice(&TEST_TPM_ALG_NULL.to_be_bytes()); // scheme
    out.extend_from_slice(&TEST_TPM_ECC_NIST_P256.to_be_bytes());
    out.extend_from_slice(&TEST_TPM_ALG_NULL.to_be_bytes()); // kdf
    out.extend_from_slice(&tpm2b(x));
    out.extend_from_slice(&tpm2b(y));
    out
}

fn encode_cert_info(extra_data: &[u8], attested_name: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&TEST_TPM_GENERATED.to_be_bytes());
    out.extend_from_slice(&TEST_TPM_ST_ATTEST_CERTIFY.to_be_bytes());
    out.extend_from_slice(&tpm2b(&[])); // qualifiedSigner
    out.extend_from_slice(&tpm2b(extra_data));
    out.extend_from_slice(&0u64.to_be_bytes()); // clock
    out.extend_from_slice(&0u32.to_be_bytes()); // resetCount
    out.extend_from_slice(&0u32.to_be_bytes()); // restartCount
    out.push(1); // safe
    out.extend_from_slice(&0u64.to_be_bytes()); // firmwareVersion
    out.extend_from_slice(&tpm2b(attested_name));
    out.extend_from_slice(&tpm2b(&[])); // qualifiedName
    out
}
