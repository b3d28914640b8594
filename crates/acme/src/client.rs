//! Challenge doğrulamasının dışa açılan ağ yüzeyi.
//!
//! [`ValidationClient`] http-01 GET, tls-alpn-01 TLS bağlantısı ve dns-01
//! TXT sorgusunu soyutlar; üretimde [`StandardValidationClient`] kullanılır,
//! testler sabit yanıt döndüren taklitler enjekte eder.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::CryptoProvider;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, AlertDescription, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;

/// RFC 7301 `no_application_protocol` alert kodu.
pub const ALERT_NO_APPLICATION_PROTOCOL: u8 = 120;

/// Ağ katmanı hataları.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// TCP/TLS/HTTP düzeyinde bağlantı hatası.
    #[error("bağlantı hatası: {message}")]
    Connection {
        /// Kaynak hata mesajı.
        message: String,
    },
    /// DNS çözümleme hatası.
    #[error("DNS çözümleme hatası: {message}")]
    Dns {
        /// Kaynak hata mesajı.
        message: String,
    },
    /// Karşı taraf TLS alert göndererek bağlantıyı kapattı.
    #[error("TLS alert {alert} alındı")]
    TlsAlert {
        /// Alert kodu; 120 `no_application_protocol` anlamına gelir.
        alert: u8,
    },
}

/// Basitleştirilmiş HTTP yanıtı.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP durum kodu.
    pub status: u16,
    /// Yanıt gövdesi.
    pub body: Vec<u8>,
}

/// TLS bağlantısı kurulurken kullanılacak parametreler.
///
/// Karşı taraf tasarım gereği self-signed bir challenge sertifikası sunar;
/// implementasyonlar sertifika doğrulamasını atlar ve TLS 1.2 tabanını
/// uygular.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsDialConfig {
    /// SNI olarak gönderilecek sunucu adı.
    pub server_name: String,
    /// Önerilecek ALPN protokolleri.
    pub alpn_protocols: Vec<String>,
}

/// Tamamlanan TLS el sıkışmasının doğrulama için gereken görünümü.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsProbe {
    /// Müzakere edilen ALPN protokolü.
    pub negotiated_alpn: Option<String>,
    /// Sunucunun gönderdiği DER kodlu sertifika zinciri.
    pub peer_certificates: Vec<Vec<u8>>,
}

/// Network capability consumed by the http-01, dns-01 and tls-alpn-01
/// verifiers. A single implementation is injected per validator; all
/// operations must observe the implementation's timeout bound.
#[async_trait]
pub trait ValidationClient: Send + Sync {
    /// Verilen URL'e GET isteği yapar.
    async fn http_get(&self, url: &str) -> Result<HttpResponse, ClientError>;

    /// `host:port` hedefine ALPN ile TLS bağlantısı kurar.
    async fn tls_dial(
        &self,
        host_port: &str,
        config: &TlsDialConfig,
    ) -> Result<TlsProbe, ClientError>;

    /// Verilen addaki TXT kayıtlarını sorgular.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ClientError>;
}

/// Production [`ValidationClient`] backed by reqwest, rustls and hickory.
pub struct StandardValidationClient {
    http: reqwest::Client,
    resolver: TokioAsyncResolver,
    provider: Arc<CryptoProvider>,
    timeout: Duration,
}

impl StandardValidationClient {
    /// Verilen zaman aşımı sınırıyla istemci oluşturur. Sınır HTTP
    /// istekleri ve TLS bağlantı kurulumu için geçerlidir.
    ///
    /// # Errors
    ///
    /// HTTP istemcisi kurulamazsa [`ClientError::Connection`] döner.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Connection {
                message: err.to_string(),
            })?;
        let resolver =
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Ok(Self {
            http,
            resolver,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
            timeout,
        })
    }

    fn tls_config(&self, dial: &TlsDialConfig) -> Result<rustls::ClientConfig, ClientError> {
        let verifier = InsecureChallengeVerifier {
            provider: Arc::clone(&self.provider),
        };
        // RFC 8737 §4: yalnızca TLS 1.2 ve üzeri müzakere edilir.
        let mut config = rustls::ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
            .map_err(|err| ClientError::Connection {
                message: err.to_string(),
            })?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();
        config.alpn_protocols = dial
            .alpn_protocols
            .iter()
            .map(|proto| proto.as_bytes().to_vec())
            .collect();
        Ok(config)
    }
}

#[async_trait]
impl ValidationClient for StandardValidationClient {
    async fn http_get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let response =
            self.http
                .get(url)
                .send()
                .await
                .map_err(|err| ClientError::Connection {
                    message: err.to_string(),
                })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| ClientError::Connection {
                message: err.to_string(),
            })?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }

    async fn tls_dial(
        &self,
        host_port: &str,
        config: &TlsDialConfig,
    ) -> Result<TlsProbe, ClientError> {
        let server_name = ServerName::try_from(config.server_name.clone()).map_err(|err| {
            ClientError::Connection {
                message: format!("geçersiz SNI değeri {}: {err}", config.server_name),
            }
        })?;
        let tcp = tokio::time::timeout(self.timeout, TcpStream::connect(host_port))
            .await
            .map_err(|_| ClientError::Connection {
                message: format!("TCP bağlantısı zaman aşımına uğradı: {host_port}"),
            })?
            .map_err(|err| ClientError::Connection {
                message: err.to_string(),
            })?;

        let connector = TlsConnector::from(Arc::new(self.tls_config(config)?));
        let stream = tokio::time::timeout(self.timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| ClientError::Connection {
                message: format!("TLS el sıkışması zaman aşımına uğradı: {host_port}"),
            })?
            .map_err(|err| classify_tls_error(&err))?;

        let (_, connection) = stream.get_ref();
        let negotiated_alpn = connection
            .alpn_protocol()
            .map(|proto| String::from_utf8_lossy(proto).into_owned());
        let peer_certificates = connection
            .peer_certificates()
            .map(|certs| certs.iter().map(|cert| cert.to_vec()).collect())
            .unwrap_or_default();
        Ok(TlsProbe {
            negotiated_alpn,
            peer_certificates,
        })
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, ClientError> {
        let lookup = self
            .resolver
            .txt_lookup(name.to_owned())
            .await
            .map_err(|err| ClientError::Dns {
                message: err.to_string(),
            })?;
        let mut records = Vec::new();
        for txt in lookup.iter() {
            // Bir TXT kaydının karakter dizileri tek değer olarak birleşir.
            let joined: Vec<u8> = txt
                .txt_data()
                .iter()
                .flat_map(|part| part.iter().copied())
                .collect();
            records.push(String::from_utf8_lossy(&joined).into_owned());
        }
        Ok(records)
    }
}

fn classify_tls_error(err: &std::io::Error) -> ClientError {
    if let Some(rustls::Error::AlertReceived(AlertDescription::NoApplicationProtocol)) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        return ClientError::TlsAlert {
            alert: ALERT_NO_APPLICATION_PROTOCOL,
        };
    }
    ClientError::Connection {
        message: err.to_string(),
    }
}

/// The peer presents a self-signed challenge certificate; the tls-alpn-01
/// verifier inspects it after the handshake, so certificate verification is
/// intentionally a no-op here.
#[derive(Debug)]
struct InsecureChallengeVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InsecureChallengeVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
