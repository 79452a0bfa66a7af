// crates/apim-policy-core/tests/proptest_round_trip.rs
// ============================================================================
// Module: Policy Round-Trip Property Tests
// Description: Build-then-parse stability across generated configurations.
// Purpose: Detect key conversion and merge drift for every typed policy.
// ============================================================================

//! Property-based tests for the declared/remote configuration round trip.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use apim_policy_core::AssetCoordinates;
use apim_policy_core::ClientIdEnforcementConfig;
use apim_policy_core::CredentialsOrigin;
use apim_policy_core::CustomClaim;
use apim_policy_core::CustomPolicyConfig;
use apim_policy_core::JwtKeyOrigin;
use apim_policy_core::JwtOrigin;
use apim_policy_core::JwtValidationConfig;
use apim_policy_core::LogLevel;
use apim_policy_core::LoggingRule;
use apim_policy_core::MessageLoggingConfig;
use apim_policy_core::PointcutCondition;
use apim_policy_core::PolicyConfiguration;
use apim_policy_core::PolicyDeclaration;
use apim_policy_core::PolicyScope;
use apim_policy_core::RateLimitTier;
use apim_policy_core::RateLimitingConfig;
use apim_policy_core::RemotePolicyDocument;
use apim_policy_core::SigningMethod;
use apim_policy_core::builders::build_configuration_data;
use apim_policy_core::builders::build_create_body;
use apim_policy_core::configuration::PUBLIC_POLICY_GROUP_ID;
use apim_policy_core::parsers::declaration_from_remote;
use apim_policy_core::parsers::parse_configuration;
use apim_policy_core::pointcut::SUPPORTED_HTTP_METHODS;
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// SECTION: Strategies
// ============================================================================

fn expression() -> impl Strategy<Value = String> {
    "#\\[[a-z]{1,8}\\]"
}

fn optional_expression() -> impl Strategy<Value = Option<String>> {
    prop::option::of(expression())
}

fn rate_limiting_strategy() -> impl Strategy<Value = RateLimitingConfig> {
    (
        prop::collection::vec((1u64 .. 100_000, 1u64 .. 86_400_000), 1 .. 4),
        optional_expression(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(tiers, key_selector, expose_headers, clusterizable)| RateLimitingConfig {
            rate_limits: tiers
                .into_iter()
                .map(|(maximum_requests, time_period_in_milliseconds)| RateLimitTier {
                    maximum_requests,
                    time_period_in_milliseconds,
                })
                .collect(),
            key_selector,
            expose_headers,
            clusterizable,
        })
}

fn client_id_strategy() -> impl Strategy<Value = ClientIdEnforcementConfig> {
    prop_oneof![
        Just(ClientIdEnforcementConfig::default()),
        (expression(), optional_expression()).prop_map(|(id, secret)| ClientIdEnforcementConfig {
            credentials_origin_has_http_basic_authentication_header:
                CredentialsOrigin::CustomExpression,
            client_id_expression: Some(id),
            client_secret_expression: secret,
        }),
    ]
}

fn claim_strategy() -> impl Strategy<Value = Vec<CustomClaim>> {
    prop::collection::btree_map("[a-z]{1,6}", "[A-Za-z0-9]{0,8}", 0 .. 3).prop_map(|claims| {
        claims.into_iter().map(|(key, value)| CustomClaim { key, value }).collect()
    })
}

fn jwt_strategy() -> impl Strategy<Value = JwtValidationConfig> {
    (
        prop_oneof![
            Just(SigningMethod::Unsigned),
            Just(SigningMethod::Rsa),
            Just(SigningMethod::Hmac),
            Just(SigningMethod::Es)
        ],
        prop_oneof![Just(256u32), Just(384u32), Just(512u32)],
        any::<bool>(),
        prop::option::of(1u64 .. 10_000),
        (any::<bool>(), any::<bool>(), any::<bool>()),
        claim_strategy(),
        claim_strategy(),
        prop::collection::vec("[a-z]{1,6}", 0 .. 3),
    )
        .prop_map(
            |(signing_method, signing_key_length, jwks, ttl, flags, mandatory, optional, headers)| {
                let (validate_aud_claim, mandatory_exp_claim, skip_client_id_validation) = flags;
                JwtValidationConfig {
                    jwt_origin: JwtOrigin::HttpBearerAuthenticationHeader,
                    signing_method,
                    signing_key_length,
                    jwt_key_origin: if jwks { JwtKeyOrigin::Jwks } else { JwtKeyOrigin::Text },
                    jwks_url: jwks.then(|| "https://idp.example.test/jwks".to_string()),
                    jwks_service_time_to_live: ttl,
                    text_key: (!jwks).then(|| "shared-secret".to_string()),
                    validate_aud_claim,
                    supported_audiences: validate_aud_claim.then(|| "orders".to_string()),
                    mandatory_exp_claim,
                    skip_client_id_validation,
                    validate_custom_claim: !mandatory.is_empty() || !optional.is_empty(),
                    mandatory_custom_claims: mandatory,
                    non_mandatory_custom_claims: optional,
                    claims_to_headers: headers,
                    ..JwtValidationConfig::default()
                }
            },
        )
}

fn logging_rule_strategy() -> impl Strategy<Value = LoggingRule> {
    (
        "[a-z]{1,10}",
        "#\\[[a-z.]{1,12}\\]",
        optional_expression(),
        prop::option::of("[a-z.]{1,10}"),
        prop_oneof![
            Just(LogLevel::Info),
            Just(LogLevel::Warn),
            Just(LogLevel::Error),
            Just(LogLevel::Debug),
            Just(LogLevel::Trace)
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(name, message, conditional, category, level, first_section, second_section)| {
            LoggingRule {
                name,
                message,
                conditional,
                category,
                level,
                first_section,
                second_section,
            }
        })
}

fn logging_strategy() -> impl Strategy<Value = MessageLoggingConfig> {
    prop::collection::vec(logging_rule_strategy(), 0 .. 4).prop_map(|logging_configuration| {
        MessageLoggingConfig {
            logging_configuration,
        }
    })
}

fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        "[a-zA-Z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z_]{1,6}", inner), 0 .. 4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn custom_strategy() -> impl Strategy<Value = CustomPolicyConfig> {
    prop::collection::vec(("[a-zA-Z_]{1,6}", json_value_strategy()), 0 .. 5)
        .prop_map(|entries| CustomPolicyConfig::new(entries.into_iter().collect()))
}

fn pointcut_strategy() -> impl Strategy<Value = Vec<PointcutCondition>> {
    prop::collection::vec(
        (prop::sample::subsequence(SUPPORTED_HTTP_METHODS.to_vec(), 1 ..= 4), "/[a-z]{1,8}/.*"),
        0 .. 3,
    )
    .prop_map(|conditions| {
        conditions
            .into_iter()
            .map(|(methods, regex)| PointcutCondition::new(methods, regex))
            .collect()
    })
}

fn round_trip(configuration: &PolicyConfiguration) -> PolicyConfiguration {
    let remote = build_configuration_data(configuration).expect("build");
    parse_configuration(configuration.kind(), &remote, None).expect("parse")
}

fn scope() -> PolicyScope {
    PolicyScope {
        org_id: "org".to_string(),
        env_id: "env".to_string(),
        api_instance_id: "18000001".to_string(),
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn rate_limiting_round_trips(config in rate_limiting_strategy()) {
        let declared = PolicyConfiguration::RateLimiting(config);
        prop_assert_eq!(round_trip(&declared), declared);
    }

    #[test]
    fn client_id_enforcement_round_trips(config in client_id_strategy()) {
        let declared = PolicyConfiguration::ClientIdEnforcement(config);
        prop_assert_eq!(round_trip(&declared), declared);
    }

    #[test]
    fn jwt_validation_round_trips(config in jwt_strategy()) {
        let declared = PolicyConfiguration::JwtValidation(config);
        prop_assert_eq!(round_trip(&declared), declared);
    }

    #[test]
    fn message_logging_round_trips(config in logging_strategy()) {
        let declared = PolicyConfiguration::MessageLogging(config);
        prop_assert_eq!(round_trip(&declared), declared);
    }

    #[test]
    fn custom_configuration_round_trips_verbatim(config in custom_strategy()) {
        let declared = PolicyConfiguration::Custom(config);
        prop_assert_eq!(round_trip(&declared), declared);
    }

    #[test]
    fn create_body_reads_back_as_declaration(
        config in rate_limiting_strategy(),
        pointcuts in pointcut_strategy(),
    ) {
        let mut declaration = PolicyDeclaration::new(
            scope(),
            AssetCoordinates {
                asset_group_id: PUBLIC_POLICY_GROUP_ID.to_string(),
                asset_id: "rate-limiting".to_string(),
                asset_version: "1.4.0".to_string(),
            },
            PolicyConfiguration::RateLimiting(config),
        );
        declaration.pointcut_conditions = pointcuts;
        let body = build_create_body(&declaration).expect("body");
        let wire = serde_json::to_string(&body).expect("serialize");
        let document: RemotePolicyDocument = serde_json::from_str(&wire).expect("deserialize");
        let parsed = declaration_from_remote(&document, scope(), None).expect("parse");
        prop_assert_eq!(parsed, declaration);
    }
}
