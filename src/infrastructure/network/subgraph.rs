// SPDX-License-Identifier: MIT

//! Protocol indexer client. Static state (pair and token listings, prices,
//! distribution APR, per-account positions) comes from a GraphQL subgraph;
//! only per-account live values are read on-chain afterwards.

use crate::domain::error::AppError;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: String,
    #[serde(default)]
    pub is_whitelisted: bool,
}

impl TokenData {
    pub fn decimals_u8(&self) -> u8 {
        self.decimals.parse().unwrap_or(18)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BribeRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeRewardTokenData {
    pub token: TokenData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeData {
    pub id: String,
    #[serde(default)]
    pub total_supply: Option<String>,
    #[serde(default)]
    pub bribe: Option<BribeRef>,
    /// Emission tokens configured on the gauge.
    #[serde(default)]
    pub reward_tokens: Vec<GaugeRewardTokenData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairData {
    pub id: String,
    pub symbol: String,
    pub is_stable: bool,
    pub token0: TokenData,
    pub token1: TokenData,
    pub reserve0: String,
    pub reserve1: String,
    pub total_supply: String,
    #[serde(default)]
    pub gauge: Option<GaugeData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityPositionData {
    pub liquidity_token_balance: String,
    pub pair: PairRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugePositionData {
    #[serde(default)]
    pub balance: String,
    pub gauge: GaugePositionRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugePositionRef {
    pub id: String,
    pub pair: PairRef,
}

/// Bribe contract attached to a lock NFT, with the pair it pays for.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BribeAttachment {
    pub id: String,
    pub pair: PairRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftBribeRef {
    pub bribe: BribeAttachment,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftData {
    pub id: String,
    #[serde(default)]
    pub locked_amount: String,
    #[serde(default)]
    pub locked_end: String,
    #[serde(default)]
    pub bribes: Vec<NftBribeRef>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub liquidity_positions: Vec<LiquidityPositionData>,
    #[serde(default)]
    pub gauge_positions: Vec<GaugePositionData>,
    #[serde(default)]
    pub nfts: Vec<NftData>,
}

#[async_trait]
pub trait Indexer: Send + Sync {
    async fn pairs(&self) -> Result<Vec<PairData>, AppError>;
    async fn tokens(&self) -> Result<Vec<TokenData>, AppError>;
    /// Native asset USD price from the bundle entity, as a decimal string.
    async fn native_price_usd(&self) -> Result<String, AppError>;
    /// Current rebase distribution APR, as a decimal string.
    async fn ve_dist_apr(&self) -> Result<String, AppError>;
    async fn user(&self, account: Address) -> Result<Option<UserData>, AppError>;
}

const PAIRS_QUERY: &str = r#"
query {
  pairs(first: 1000) {
    id
    symbol
    isStable
    token0 { id symbol name decimals isWhitelisted }
    token1 { id symbol name decimals isWhitelisted }
    reserve0
    reserve1
    totalSupply
    gauge {
      id
      totalSupply
      bribe { id }
      rewardTokens { token { id symbol name decimals isWhitelisted } }
    }
  }
}"#;

const TOKENS_QUERY: &str = r#"
query {
  tokens(first: 1000, where: { isWhitelisted: true }) {
    id
    symbol
    name
    decimals
    isWhitelisted
  }
}"#;

const BUNDLE_QUERY: &str = r#"
query {
  bundles(first: 1) { ethPrice }
}"#;

const VE_DIST_QUERY: &str = r#"
query {
  veDistEntities(first: 1) { apr }
}"#;

pub struct SubgraphClient {
    http: reqwest::Client,
    url: Url,
}

impl SubgraphClient {
    pub fn new(url: &str) -> Result<Self, AppError> {
        let url =
            Url::parse(url).map_err(|e| AppError::Config(format!("Invalid subgraph URL: {}", e)))?;
        Ok(Self {
            http: reqwest::Client::new(),
            url,
        })
    }

    async fn query<T: DeserializeOwned>(&self, body: &str) -> Result<T, AppError> {
        #[derive(Deserialize)]
        struct GraphError {
            message: String,
        }
        #[derive(Deserialize)]
        struct Envelope<T> {
            data: Option<T>,
            #[serde(default)]
            errors: Option<Vec<GraphError>>,
        }

        let response = self
            .http
            .post(self.url.clone())
            .json(&serde_json::json!({ "query": body }))
            .send()
            .await
            .map_err(|e| AppError::Subgraph(format!("request failed: {}", e)))?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| AppError::Subgraph(format!("invalid response: {}", e)))?;

        if let Some(errors) = envelope.errors
            && let Some(first) = errors.first()
        {
            return Err(AppError::Subgraph(first.message.clone()));
        }
        envelope
            .data
            .ok_or_else(|| AppError::Subgraph("response carried no data".to_string()))
    }
}

#[async_trait]
impl Indexer for SubgraphClient {
    async fn pairs(&self) -> Result<Vec<PairData>, AppError> {
        #[derive(Deserialize)]
        struct Data {
            pairs: Vec<PairData>,
        }
        Ok(self.query::<Data>(PAIRS_QUERY).await?.pairs)
    }

    async fn tokens(&self) -> Result<Vec<TokenData>, AppError> {
        #[derive(Deserialize)]
        struct Data {
            tokens: Vec<TokenData>,
        }
        Ok(self.query::<Data>(TOKENS_QUERY).await?.tokens)
    }

    async fn native_price_usd(&self) -> Result<String, AppError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Bundle {
            eth_price: String,
        }
        #[derive(Deserialize)]
        struct Data {
            bundles: Vec<Bundle>,
        }
        let data = self.query::<Data>(BUNDLE_QUERY).await?;
        data.bundles
            .into_iter()
            .next()
            .map(|b| b.eth_price)
            .ok_or_else(|| AppError::Subgraph("no price bundle".to_string()))
    }

    async fn ve_dist_apr(&self) -> Result<String, AppError> {
        #[derive(Deserialize)]
        struct Entity {
            apr: String,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            ve_dist_entities: Vec<Entity>,
        }
        let data = self.query::<Data>(VE_DIST_QUERY).await?;
        Ok(data
            .ve_dist_entities
            .into_iter()
            .next()
            .map(|e| e.apr)
            .unwrap_or_else(|| "0".to_string()))
    }

    async fn user(&self, account: Address) -> Result<Option<UserData>, AppError> {
        #[derive(Deserialize)]
        struct Data {
            user: Option<UserData>,
        }
        let body = format!(
            r#"
query {{
  user(id: "{:#x}") {{
    liquidityPositions {{ liquidityTokenBalance pair {{ id }} }}
    gaugePositions {{ balance gauge {{ id pair {{ id }} }} }}
    nfts {{ id lockedAmount lockedEnd bribes {{ bribe {{ id pair {{ id }} }} }} }}
  }}
}}"#,
            account
        );
        Ok(self.query::<Data>(&body).await?.user)
    }
}
