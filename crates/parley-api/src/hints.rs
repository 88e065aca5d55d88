use axum::http::HeaderMap;
use serde::Serialize;

const LATITUDE_HEADER: &str = "x-vercel-ip-latitude";
const LONGITUDE_HEADER: &str = "x-vercel-ip-longitude";
const CITY_HEADER: &str = "x-vercel-ip-city";
const COUNTRY_HEADER: &str = "x-vercel-ip-country";

/// Coarse caller location as reported by the edge proxy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestHints {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl RequestHints {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            latitude: read(LATITUDE_HEADER),
            longitude: read(LONGITUDE_HEADER),
            city: read(CITY_HEADER),
            country: read(COUNTRY_HEADER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reads_present_headers_only() {
        let mut headers = HeaderMap::new();
        headers.insert(CITY_HEADER, HeaderValue::from_static("Lisbon"));
        headers.insert(COUNTRY_HEADER, HeaderValue::from_static(""));

        let hints = RequestHints::from_headers(&headers);
        assert_eq!(hints.city.as_deref(), Some("Lisbon"));
        assert_eq!(hints.country, None);
        assert_eq!(hints.latitude, None);
    }
}
