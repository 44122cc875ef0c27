pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Catalog unavailable: {message}")]
	CatalogUnavailable { message: String },
}

impl From<comps_catalog::Error> for Error {
	fn from(err: comps_catalog::Error) -> Self {
		match err {
			comps_catalog::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			comps_catalog::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			comps_catalog::Error::NotFound(message) => Self::Storage { message },
		}
	}
}

impl From<comps_providers::Error> for Error {
	fn from(err: comps_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
