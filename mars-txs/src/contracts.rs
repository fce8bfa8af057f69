//! Known Terra Classic contract addresses of the Mars ecosystem.
//!
//! Addresses are bech32 strings compared verbatim against message fields,
//! so they are kept exactly as the chain reports them (lower case).

/// xMARS token (CW20). Sending xMARS to the staking contract starts unstaking.
pub const XMARS_TOKEN: &str = "terra1a04v570f9cxp49mk06vjsm8axsswndpwwt67k4";

/// Mars staking contract.
pub const MARS_STAKING: &str = "terra1y8wwr5q24msk55x9smwn0ptyt24fxpwm4l7tjl";

/// Astroport MARS-UST liquidity token (CW20).
pub const ASTROPORT_MARS_UST_LP: &str = "terra1ww6sqvfgmktp0afcmvg78st6z89x5zr3tmvpss";

/// Apollo vault entry point (routes deposits and withdrawals to strategies).
pub const APOLLO_ENTRY: &str = "terra1g7jjjkt5uvkjeyhp8ecdz4e4hvtn83sud3tmh2";

/// Apollo MARS-UST auto-compounding strategy.
pub const APOLLO_MARS_UST_STRATEGY: &str = "terra1au5kxqz46r6qtqqk2nur4wr2yd457zp4fscuzx";

/// Strategy id of [`APOLLO_MARS_UST_STRATEGY`] at [`APOLLO_ENTRY`].
pub const APOLLO_MARS_UST_STRATEGY_ID: u64 = 50;

/// Spectrum staker entry point (zap and bond).
pub const SPECTRUM_ENTRY: &str = "terra1mwnu40j5q8c42kv59kqx0u2peyku94564wwhvd";

/// Spectrum MARS-UST farm.
pub const SPECTRUM_MARS_UST_FARM: &str = "terra1d55nmhuq75r3vf93hwkau2stts4mpe9h22herz";
