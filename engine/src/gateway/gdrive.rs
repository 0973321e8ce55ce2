use std::sync::Arc;

use camino::Utf8Path;
use colabme::id::{Id, IdBuf};

use crate::oauth2::GetToken;

#[derive(Clone)]
pub struct GoogleDrive<A> {
    client: reqwest::Client,
    auth: Arc<A>,
    base_url: &'static str,
    upload_base_url: &'static str,
    user_agent: String,

    user: api::User,
    quota: api::Quota,
}

impl<A> GoogleDrive<A>
where
    A: GetToken,
{
    /// Connects to the drive and checks that `auth` grants access to it.
    pub async fn new(auth: A, client: reqwest::Client) -> colabme::Result<Self> {
        let user_agent = format!("colabme/{}", env!("CARGO_PKG_VERSION"));
        let mut drive = Self {
            auth: Arc::new(auth),
            client,
            base_url: "https://www.googleapis.com/drive/v3",
            upload_base_url: "https://www.googleapis.com/upload/drive/v3",
            user_agent,
            user: api::User::default(),
            quota: api::Quota::default(),
        };

        let about = drive.about_get().await?;
        drive.user = about.user;
        drive.quota = about.storage_quota;

        log::info!(
            "Access granted to Drive of {}{}",
            drive.user.display_name,
            drive
                .user
                .email_address
                .as_ref()
                .map(|em| format!(" <{em}>"))
                .unwrap_or_default(),
        );
        if let (&Some(usage), &Some(limit)) = (&drive.quota.usage, &drive.quota.limit) {
            use byte_unit::{Byte, UnitType};
            if let (Some(usage), Some(limit)) = (Byte::from_i64(usage), Byte::from_i64(limit)) {
                let usage = usage.get_appropriate_unit(UnitType::Binary);
                let limit = limit.get_appropriate_unit(UnitType::Binary);
                log::info!("Usage {usage:#.2} / {limit:#.3}");
            }
        }

        Ok(drive)
    }
}

impl<A> super::MkDir for GoogleDrive<A>
where
    A: GetToken,
{
    async fn mkdir(&self, parent_id: Option<&Id>, name: &str) -> colabme::Result<IdBuf> {
        if let Some(parent_id) = parent_id {
            log::info!("creating folder {name} in folder {parent_id}");
        } else {
            log::info!("creating folder {name} in root folder");
        }
        let f = api::File {
            id: None,
            name: Some(name.to_string()),
            modified_time: None,
            mime_type: Some(FOLDER_MIMETYPE.to_string()),
            parents: parent_id.map(|id| vec![id.to_id_buf()]),
        };
        let res = self.files_create(&f).await?;
        res.id
            .ok_or_else(|| colabme::api_error!("No ID returned for folder {name}"))
    }
}

impl<A> super::CreateFile for GoogleDrive<A>
where
    A: GetToken,
{
    async fn create_file(&self, parent_id: Option<&Id>, path: &Utf8Path) -> colabme::Result<IdBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| colabme::PathError::Illegal(path.to_owned(), None))?;
        let data = tokio::fs::File::open(path).await?;
        let metadata = data.metadata().await?;
        let size = metadata.len();
        log::info!("uploading file {path} ({size} bytes)");

        let file = api::File {
            id: None,
            name: Some(name.to_string()),
            modified_time: metadata.modified().ok().map(Into::into),
            mime_type: None,
            parents: parent_id.map(|id| vec![id.to_id_buf()]),
        };
        let file = self
            .files_upload(reqwest::Method::POST, &file, size, data)
            .await?;
        file.id
            .ok_or_else(|| colabme::api_error!("No ID returned for {path}"))
    }
}

impl<A> super::Delete for GoogleDrive<A>
where
    A: GetToken,
{
    async fn delete(&self, id: &Id) -> colabme::Result<()> {
        log::info!("deleting {id}");
        self.files_delete(id).await
    }
}

impl<A> super::Gateway for GoogleDrive<A> where A: GetToken {}

const FOLDER_MIMETYPE: &str = "application/vnd.google-apps.folder";

mod api {
    use chrono::{DateTime, Utc};
    use colabme::{error, id::Id, id::IdBuf};
    use http::StatusCode;
    use serde::{Deserialize, Serialize};
    use tokio::io;

    use super::utils::{check_response, num_from_str};
    use crate::oauth2::GetToken;

    #[derive(Default, Clone, Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub display_name: String,
        pub email_address: Option<String>,
    }

    #[derive(Default, Clone, Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Quota {
        #[serde(default, deserialize_with = "num_from_str")]
        pub limit: Option<i64>,
        #[serde(default, deserialize_with = "num_from_str")]
        pub usage: Option<i64>,
    }

    const ABOUT_FIELDS: &str = "kind,storageQuota,user";

    #[derive(Default, Clone, Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct About {
        kind: String,
        pub storage_quota: Quota,
        pub user: User,
    }

    const FILE_FIELDS: &str = "id,name,modifiedTime,mimeType,parents";

    #[derive(Default, Clone, Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct File {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<IdBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub modified_time: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub mime_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub parents: Option<Vec<IdBuf>>,
    }

    #[derive(Debug, Clone, Copy)]
    pub enum Scope {
        Full,
    }

    impl AsRef<str> for Scope {
        fn as_ref(&self) -> &str {
            match self {
                Scope::Full => "https://www.googleapis.com/auth/drive",
            }
        }
    }

    impl From<Scope> for oauth2::Scope {
        fn from(value: Scope) -> Self {
            oauth2::Scope::new(value.as_ref().to_string())
        }
    }

    #[derive(Debug, Clone)]
    pub struct UploadParams<'a> {
        pub size: u64,
        pub mime_type: Option<&'a str>,
        pub fields: &'a str,
    }

    impl<'a> UploadParams<'a> {
        pub fn query_params(&'a self) -> Vec<(&'static str, &'a str)> {
            vec![
                ("uploadType", "resumable"),
                ("fields", self.fields),
                ("supportsAllDrives", "true"),
            ]
        }
    }

    /// Chunk size of resumable uploads, must be a multiple of 256 KiB.
    const UPLOAD_CHUNK_SZ: u64 = 2 * 256 * 1024;

    impl<A> super::GoogleDrive<A>
    where
        A: GetToken,
    {
        pub async fn about_get(&self) -> colabme::Result<About> {
            let path = "/about";
            let query_params = [("fields", ABOUT_FIELDS)];

            let res = self.get_query(&[Scope::Full], path, query_params).await?;
            let res = check_response("GET", path, res).await?;
            let about: About = res.json().await.map_err(error::api)?;
            if about.kind != "drive#about" {
                colabme::api_bail!("/about returned wrong kind!");
            }
            Ok(about)
        }

        pub async fn files_create(&self, file: &File) -> colabme::Result<File> {
            let scopes = &[Scope::Full];
            let path = "/files";
            let query_params = [("fields", FILE_FIELDS), ("supportsAllDrives", "true")];
            let res = self
                .post_json_query(scopes, path, query_params, file)
                .await?;
            let res = check_response("POST", path, res).await?;

            let file: File = res.json().await.map_err(error::api)?;
            Ok(file)
        }

        pub async fn files_upload<D>(
            &self,
            method: reqwest::Method,
            file: &File,
            data_len: u64,
            data: D,
        ) -> colabme::Result<File>
        where
            D: io::AsyncRead,
        {
            use io::AsyncReadExt;

            let scopes = &[Scope::Full];
            let upload_params = UploadParams {
                size: data_len,
                mime_type: file.mime_type.as_deref(),
                fields: FILE_FIELDS,
            };
            let upload_url = self
                .upload_request(method, scopes, "/files", &upload_params, file)
                .await?;

            tokio::pin!(data);

            let mut sent = 0u64;
            let file: File = loop {
                let mut buf: Vec<u8> = Vec::with_capacity(UPLOAD_CHUNK_SZ as _);
                let sz = data
                    .as_mut()
                    .take(UPLOAD_CHUNK_SZ)
                    .read_to_end(&mut buf)
                    .await?;
                log::trace!("uploading {sz} bytes");
                let res = self
                    .upload_range(
                        reqwest::Method::PUT,
                        scopes,
                        upload_url.clone(),
                        buf,
                        sent,
                        data_len,
                    )
                    .await?;
                sent += sz as u64;
                let status = res.status();
                if status.is_success() && sent >= data_len {
                    break res.json().await.map_err(error::api)?;
                } else if status.is_server_error() {
                    colabme::api_bail!("Upload failed ({status}). No support yet to resume upload");
                } else if status.is_client_error() {
                    colabme::api_bail!(
                        "Upload rejected ({status}): {}",
                        res.text().await.unwrap_or_default()
                    );
                } else if sz == 0 {
                    colabme::api_bail!("File shrunk during upload: sent {sent} of {data_len} bytes");
                }
            };
            Ok(file)
        }

        pub async fn files_delete(&self, file_id: &Id) -> colabme::Result<()> {
            let scopes = &[Scope::Full];
            let path = format!("/files/{file_id}");
            let query_params = [("supportsAllDrives", "true")];
            let res = self.delete_query(scopes, &path, query_params).await?;
            if res.status() == StatusCode::NOT_FOUND {
                log::info!("{file_id} was already deleted");
                return Ok(());
            }
            check_response("DELETE", &path, res).await?;
            Ok(())
        }
    }
}

mod utils {
    use std::borrow::Borrow;

    use colabme::error;
    use oauth2::AccessToken;
    use reqwest::{header, Response, StatusCode};
    use serde::{Deserialize, Deserializer, Serialize};
    use url::Url;

    use super::api;
    use crate::oauth2::GetToken;

    pub fn num_from_str<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use std::str::FromStr;

        let s = String::deserialize(deserializer)?;
        Ok(Some(i64::from_str(&s).map_err(serde::de::Error::custom)?))
    }

    pub async fn check_response(
        method: &str,
        path: &str,
        res: Response,
    ) -> colabme::Result<Response> {
        if !res.status().is_success() {
            colabme::api_bail!(
                "{method} {path} returned {}\n{}",
                res.status(),
                res.text().await.map_err(error::io)?
            );
        }
        Ok(res)
    }

    impl<A> super::GoogleDrive<A>
    where
        A: GetToken,
    {
        pub async fn fetch_token(&self, scopes: &[api::Scope]) -> colabme::Result<AccessToken> {
            let scopes = scopes.iter().map(|&s| s.into()).collect();
            self.auth.get_token(scopes).await
        }

        pub async fn get_query<Q, K, V>(
            &self,
            scopes: &[api::Scope],
            path: &str,
            query_params: Q,
        ) -> colabme::Result<Response>
        where
            Q: IntoIterator,
            Q::Item: Borrow<(K, V)>,
            K: AsRef<str>,
            V: AsRef<str>,
        {
            let token = self.fetch_token(scopes).await?;
            let url = url_with_query(self.base_url, path, query_params)?;

            self.client
                .get(url)
                .header(header::USER_AGENT, &self.user_agent)
                .bearer_auth(token.secret())
                .send()
                .await
                .map_err(error::api)
        }

        pub async fn post_json_query<T, Q, K, V>(
            &self,
            scopes: &[api::Scope],
            path: &str,
            query_params: Q,
            body: &T,
        ) -> colabme::Result<Response>
        where
            T: Serialize,
            Q: IntoIterator,
            Q::Item: Borrow<(K, V)>,
            K: AsRef<str>,
            V: AsRef<str>,
        {
            let token = self.fetch_token(scopes).await?;
            let url = url_with_query(self.base_url, path, query_params)?;
            self.client
                .post(url)
                .bearer_auth(token.secret())
                .header(header::USER_AGENT, &self.user_agent)
                .json(body)
                .send()
                .await
                .map_err(error::api)
        }

        pub async fn upload_request<B>(
            &self,
            method: reqwest::Method,
            scopes: &[api::Scope],
            path: &str,
            params: &api::UploadParams<'_>,
            body: &B,
        ) -> colabme::Result<Url>
        where
            B: Serialize,
        {
            let token = self.fetch_token(scopes).await?;

            let url = url_with_query(self.upload_base_url, path, params.query_params())?;
            let mut req = self
                .client
                .request(method, url.clone())
                .bearer_auth(token.secret())
                .header(header::USER_AGENT, &self.user_agent)
                .header("X-Upload-Content-Length", params.size);
            if let Some(mt) = params.mime_type {
                req = req.header("X-Upload-Content-Type", mt);
            }
            let res = req.json(body).send().await.map_err(error::api)?;

            if res.status() != StatusCode::OK {
                colabme::api_bail!(
                    "POST {url} returned {}\n{}",
                    res.status(),
                    res.text().await.unwrap_or_default()
                );
            }
            let location = res
                .headers()
                .get(header::LOCATION)
                .ok_or_else(|| colabme::api_error!("No upload location returned by {url}"))?;
            let location = location.to_str().map_err(error::api)?;
            Url::parse(location).map_err(error::api)
        }

        pub async fn upload_range(
            &self,
            method: reqwest::Method,
            scopes: &[api::Scope],
            url: Url,
            data: Vec<u8>,
            range_start: u64,
            range_len: u64,
        ) -> colabme::Result<Response> {
            let token = self.fetch_token(scopes).await?;

            let data_len = data.len() as u64;
            debug_assert!(range_len >= range_start + data_len);

            let mut req = self
                .client
                .request(method, url)
                .bearer_auth(token.secret())
                .header(header::USER_AGENT, &self.user_agent)
                .header(header::CONTENT_LENGTH, data_len);
            if data_len > 0 && (range_start > 0 || data_len < range_len) {
                req = req.header(
                    header::CONTENT_RANGE,
                    format!(
                        "bytes {range_start}-{}/{range_len}",
                        range_start + data_len - 1
                    ),
                );
            }
            req.body(data).send().await.map_err(error::api)
        }

        pub async fn delete_query<Q, K, V>(
            &self,
            scopes: &[api::Scope],
            path: &str,
            query_params: Q,
        ) -> colabme::Result<Response>
        where
            Q: IntoIterator,
            Q::Item: Borrow<(K, V)>,
            K: AsRef<str>,
            V: AsRef<str>,
        {
            let token = self.fetch_token(scopes).await?;
            let url = url_with_query(self.base_url, path, query_params)?;
            self.client
                .delete(url)
                .bearer_auth(token.secret())
                .header(header::USER_AGENT, &self.user_agent)
                .header(header::CONTENT_LENGTH, 0)
                .send()
                .await
                .map_err(error::api)
        }
    }

    pub fn url_with_query<B, P, Q, K, V>(base_url: B, path: P, query_params: Q) -> colabme::Result<Url>
    where
        B: AsRef<str>,
        P: AsRef<str>,
        Q: IntoIterator,
        Q::Item: Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let base = format!("{}{}", base_url.as_ref(), path.as_ref());
        Url::parse_with_params(&base, query_params).map_err(error::api)
    }

    #[test]
    fn test_url_with_query() {
        let url = url_with_query(
            "https://www.googleapis.com/drive/v3",
            "/files/abc",
            [("supportsAllDrives", "true")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/drive/v3/files/abc?supportsAllDrives=true"
        );
    }
}
