use serde::{Deserialize, Serialize};

/// A customized accelerator of the Application Accelerator of an enterprise service.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizedAcceleratorResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<CustomizedAcceleratorProperties>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizedAcceleratorProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repository: Option<AcceleratorGitRepository>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorGitRepository {
    pub url: String,

    pub auth_setting: AcceleratorAuthSetting,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_in_seconds: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
}

/// The polymorphic auth setting of an accelerator git repository, discriminated by `authType`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "authType")]
pub enum AcceleratorAuthSetting {
    Public(AcceleratorPublicSetting),
    BasicAuth(AcceleratorBasicAuthSetting),
    #[serde(rename = "SSH")]
    Ssh(AcceleratorSshSetting),
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorPublicSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_resource_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorBasicAuthSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_resource_id: Option<String>,

    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorSshSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_algorithm: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn auth_setting_is_tagged_by_auth_type() {
        let ssh = AcceleratorAuthSetting::Ssh(AcceleratorSshSetting {
            private_key: Some("key".to_owned()),
            ..AcceleratorSshSetting::default()
        });
        assert_eq!(
            serde_json::to_value(&ssh).expect("serializable"),
            json!({"authType": "SSH", "privateKey": "key"})
        );

        let basic: AcceleratorAuthSetting =
            serde_json::from_value(json!({"authType": "BasicAuth", "username": "git"}))
                .expect("deserializable");
        assert_eq!(
            basic,
            AcceleratorAuthSetting::BasicAuth(AcceleratorBasicAuthSetting {
                username: "git".to_owned(),
                ..AcceleratorBasicAuthSetting::default()
            })
        );
    }
}
