//! # Vault Operations
//!
//! The state machine that composes the engine's ledgers into user-facing
//! operations. One `VaultOperations` instance is one vault: a pooled
//! stable balance, a share token priced against live NAV, a staking
//! escrow accruing a reward token, and a set of externally held positions
//! priced by the injected oracle.
//!
//! Lifecycle: the vault starts `Uninitialized`, accepting only seeded
//! capital. `start_vault_operation` is the one-way transition to
//! `Operating`, minting the bootstrap shares against the seed. An
//! orthogonal paused flag blocks value-moving entry points while leaving
//! the rescue operations (migration) available.
//!
//! Ordering discipline inside every entry point: derive NAV, validate,
//! perform external custody calls, and only then touch the books. A
//! failure at any step before the first ledger write aborts the whole
//! operation with nothing changed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use meridian_engine::amount::{percent_of, rescale, U256};
use meridian_engine::auth::{Action, Authorizer};
use meridian_engine::clock::Clock;
use meridian_engine::config::{VaultParams, REWARD_DECIMALS, VAULT_ADDRESS};
use meridian_engine::error::VaultError;
use meridian_engine::exchange::{shares_to_usd, usd_to_shares};
use meridian_engine::ledger::{FeeKind, FeeLedger, ShareLedger, StakeAccrualLedger, TokenLedger};
use meridian_engine::oracle::{PositionCustody, PositionRef, ValuationOracle};

/// Lifecycle state of a vault. The transition is one-way and happens
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultState {
    /// Created, accepting seed capital, rejecting user operations.
    Uninitialized,
    /// Bootstrapped and open for business.
    Operating,
}

/// One vault: ledgers, holdings, parameters, and the injected seams to
/// the outside world.
pub struct VaultOperations {
    params: VaultParams,
    state: VaultState,
    paused: bool,
    stable: TokenLedger,
    reward: TokenLedger,
    shares: ShareLedger,
    stakes: StakeAccrualLedger,
    fees: FeeLedger,
    holdings: Vec<PositionRef>,
    oracle: Arc<dyn ValuationOracle>,
    custody: Arc<dyn PositionCustody>,
    authorizer: Arc<dyn Authorizer>,
    clock: Arc<dyn Clock>,
}

impl VaultOperations {
    /// Creates an uninitialized vault with the given parameters and
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidAmount`] if any parameter is out of
    /// range.
    pub fn new(
        params: VaultParams,
        oracle: Arc<dyn ValuationOracle>,
        custody: Arc<dyn PositionCustody>,
        authorizer: Arc<dyn Authorizer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VaultError> {
        params.validate()?;
        let stable = TokenLedger::new("USDm", params.stable_decimals);
        let reward = TokenLedger::new("MRWD", REWARD_DECIMALS);
        Ok(Self {
            params,
            state: VaultState::Uninitialized,
            paused: false,
            stable,
            reward,
            shares: ShareLedger::new(),
            stakes: StakeAccrualLedger::new(),
            fees: FeeLedger::new(),
            holdings: Vec::new(),
            oracle,
            custody,
            authorizer,
            clock,
        })
    }

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    fn ensure_operating(&self) -> Result<(), VaultError> {
        if self.state != VaultState::Operating {
            return Err(VaultError::NotOperating);
        }
        Ok(())
    }

    /// Operating and not paused: the gate for every value-moving entry
    /// point except migration.
    fn ensure_active(&self) -> Result<(), VaultError> {
        self.ensure_operating()?;
        if self.paused {
            return Err(VaultError::Paused);
        }
        Ok(())
    }

    pub(crate) fn authorize(&self, caller: &str, action: Action) -> Result<(), VaultError> {
        if !self.authorizer.is_authorized(caller, action) {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
                action,
            });
        }
        Ok(())
    }

    fn ensure_positive(amount: U256, reason: &'static str) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount { reason });
        }
        Ok(())
    }

    fn ensure_stable_reserve(&self, needed: U256) -> Result<(), VaultError> {
        let available = self.stable.balance_of(VAULT_ADDRESS);
        if available < needed {
            return Err(VaultError::InsufficientBalance {
                available,
                requested: needed,
            });
        }
        Ok(())
    }

    fn ensure_held(&self, position: &PositionRef) -> Result<(), VaultError> {
        if !self.holdings.contains(position) {
            return Err(VaultError::InvalidAmount {
                reason: "position is not held by the vault",
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Boundary inflow and bootstrap
    // -----------------------------------------------------------------------

    /// Credits stable currency arriving from outside the vault boundary
    /// to `holder`. This is how users fund their accounts and how the
    /// vault treasury is seeded before bootstrap.
    pub fn credit_stable(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        Self::ensure_positive(amount, "credited amount must be positive")?;
        self.stable.mint(holder, amount)?;
        info!(holder, amount = %amount, "stable credited at boundary");
        Ok(())
    }

    /// One-way transition from `Uninitialized` to `Operating`. Requires
    /// seeded treasury capital; mints the bootstrap share supply to the
    /// vault's own address at the fixed 1:1 rescaled rate.
    ///
    /// # Errors
    ///
    /// [`VaultError::AlreadyOperating`] on a second call,
    /// [`VaultError::Unauthorized`] without the capability,
    /// [`VaultError::InvalidAmount`] if no capital was seeded.
    pub fn start_vault_operation(&mut self, caller: &str) -> Result<U256, VaultError> {
        self.authorize(caller, Action::StartOperation)?;
        if self.state == VaultState::Operating {
            return Err(VaultError::AlreadyOperating);
        }
        let seed = self.stable.balance_of(VAULT_ADDRESS);
        Self::ensure_positive(seed, "vault has no seeded capital")?;
        let bootstrap = rescale(seed, self.params.stable_decimals, self.params.share_decimals)?;
        self.shares.mint(VAULT_ADDRESS, bootstrap)?;
        self.state = VaultState::Operating;
        info!(caller, seed = %seed, bootstrap = %bootstrap, "vault operation started");
        Ok(bootstrap)
    }

    // -----------------------------------------------------------------------
    // Deposits and redemption
    // -----------------------------------------------------------------------

    /// Deposits `amount` of stable currency, minting shares at the
    /// pre-deposit NAV. No entry fee.
    pub fn deposit_stable(&mut self, caller: &str, amount: U256) -> Result<U256, VaultError> {
        self.ensure_active()?;
        Self::ensure_positive(amount, "deposit amount must be positive")?;
        let nav = self.pool_nav()?;
        let minted = usd_to_shares(amount, nav, self.shares.total_supply(), &self.params)?;
        self.stable.transfer(caller, VAULT_ADDRESS, amount)?;
        self.shares.mint(caller, minted)?;
        info!(caller, amount = %amount, minted = %minted, nav = %nav, "stable deposited");
        Ok(minted)
    }

    /// Deposits `amount` of stable currency and stakes the minted shares
    /// in the same operation; the shares never touch the caller's free
    /// balance.
    pub fn deposit_stable_with_stake(
        &mut self,
        caller: &str,
        amount: U256,
    ) -> Result<U256, VaultError> {
        self.ensure_active()?;
        Self::ensure_positive(amount, "deposit amount must be positive")?;
        let nav = self.pool_nav()?;
        let minted = usd_to_shares(amount, nav, self.shares.total_supply(), &self.params)?;
        let now = self.clock.now();
        self.stakes
            .rebase(caller, self.params.reward_rate_percent, now)?;
        self.stable.transfer(caller, VAULT_ADDRESS, amount)?;
        self.shares.mint_to_escrow(minted)?;
        self.stakes
            .stake(caller, minted, self.params.reward_rate_percent, now)?;
        info!(caller, amount = %amount, minted = %minted, "stable deposited and staked");
        Ok(minted)
    }

    /// Redeems `share_amount` of free shares for their stable value at
    /// the current NAV, net of the redemption fee. The fee stays in the
    /// pool and accrues to the redemption bucket until swept.
    pub fn redeem_shares(&mut self, caller: &str, share_amount: U256) -> Result<U256, VaultError> {
        self.ensure_active()?;
        Self::ensure_positive(share_amount, "redemption amount must be positive")?;
        let nav = self.pool_nav()?;
        let supply = self.shares.total_supply();
        if nav.is_zero() && !supply.is_zero() {
            return Err(VaultError::DegenerateNav { supply });
        }
        let gross = shares_to_usd(share_amount, nav, supply)?;
        let fee = percent_of(gross, self.params.redemption_fee_percent)?;
        let net = gross - fee;
        self.ensure_stable_reserve(net)?;
        self.shares.burn(caller, share_amount)?;
        self.stable.transfer(VAULT_ADDRESS, caller, net)?;
        self.fees.accrue(FeeKind::Redemption, fee)?;
        info!(caller, shares = %share_amount, net = %net, fee = %fee, "shares redeemed");
        Ok(net)
    }

    // -----------------------------------------------------------------------
    // Staking and rewards
    // -----------------------------------------------------------------------

    /// Moves `amount` of the caller's free shares into the staking
    /// escrow. Accrual on any existing position folds at the old
    /// principal first.
    pub fn stake(&mut self, caller: &str, amount: U256) -> Result<(), VaultError> {
        self.ensure_active()?;
        Self::ensure_positive(amount, "stake amount must be positive")?;
        let now = self.clock.now();
        self.stakes
            .rebase(caller, self.params.reward_rate_percent, now)?;
        self.shares.stake_to_escrow(caller, amount)?;
        self.stakes
            .stake(caller, amount, self.params.reward_rate_percent, now)?;
        info!(caller, amount = %amount, "shares staked");
        Ok(())
    }

    /// Returns `amount` of staked shares to the caller's free balance.
    /// Rewards earned up to now are folded first and stay claimable.
    pub fn unstake(&mut self, caller: &str, amount: U256) -> Result<(), VaultError> {
        self.ensure_active()?;
        Self::ensure_positive(amount, "unstake amount must be positive")?;
        let now = self.clock.now();
        self.stakes
            .unstake(caller, amount, self.params.reward_rate_percent, now)?;
        self.shares.release_from_escrow(caller, amount)?;
        info!(caller, amount = %amount, "shares unstaked");
        Ok(())
    }

    /// Claims `amount` of accrued reward. The earning fee is deducted,
    /// the net reward token is minted to the caller, and the fee portion
    /// is minted to the vault treasury pending sweep.
    pub fn claim_reward(&mut self, caller: &str, amount: U256) -> Result<U256, VaultError> {
        self.ensure_active()?;
        let now = self.clock.now();
        self.stakes
            .claim(caller, amount, self.params.reward_rate_percent, now)?;
        let fee = percent_of(amount, self.params.earning_fee_percent)?;
        let net = amount - fee;
        self.reward.mint(caller, net)?;
        self.reward.mint(VAULT_ADDRESS, fee)?;
        self.fees.accrue(FeeKind::Earning, fee)?;
        info!(caller, amount = %amount, net = %net, fee = %fee, "reward claimed");
        Ok(net)
    }

    /// Claims everything the caller has accrued. A holder with nothing
    /// redeemable gets `0` back rather than an error.
    pub fn claim_all_rewards(&mut self, caller: &str) -> Result<U256, VaultError> {
        self.ensure_active()?;
        let now = self.clock.now();
        let redeemable = self
            .stakes
            .redeemable(caller, self.params.reward_rate_percent, now)?;
        if redeemable.is_zero() {
            return Ok(U256::zero());
        }
        self.claim_reward(caller, redeemable)
    }

    // -----------------------------------------------------------------------
    // External position flows
    // -----------------------------------------------------------------------

    /// Takes custody of an external position and pays the caller its
    /// oracle value in stable currency, net of the repayment fee.
    pub fn deposit_position(
        &mut self,
        caller: &str,
        position: PositionRef,
    ) -> Result<U256, VaultError> {
        self.ensure_active()?;
        let value = self.oracle.value_of_position(&position)?;
        Self::ensure_positive(value, "position has no oracle value")?;
        let fee = percent_of(value, self.params.repayment_fee_percent)?;
        let net = value - fee;
        self.ensure_stable_reserve(net)?;
        self.custody.transfer_position_in(caller, &position)?;
        self.holdings.push(position);
        self.stable.transfer(VAULT_ADDRESS, caller, net)?;
        self.fees.accrue(FeeKind::Repayment, fee)?;
        info!(caller, %position, value = %value, net = %net, "position deposited for stable");
        Ok(net)
    }

    /// Takes custody of an external position and mints shares at its
    /// oracle value against the pre-deposit NAV. No fee. With `stake`
    /// set, the shares go straight into escrow.
    pub fn deposit_position_for_shares(
        &mut self,
        caller: &str,
        position: PositionRef,
        stake: bool,
    ) -> Result<U256, VaultError> {
        self.ensure_active()?;
        let value = self.oracle.value_of_position(&position)?;
        Self::ensure_positive(value, "position has no oracle value")?;
        let nav = self.pool_nav()?;
        let minted = usd_to_shares(value, nav, self.shares.total_supply(), &self.params)?;
        let now = self.clock.now();
        if stake {
            self.stakes
                .rebase(caller, self.params.reward_rate_percent, now)?;
        }
        self.custody.transfer_position_in(caller, &position)?;
        self.holdings.push(position);
        if stake {
            self.shares.mint_to_escrow(minted)?;
            self.stakes
                .stake(caller, minted, self.params.reward_rate_percent, now)?;
        } else {
            self.shares.mint(caller, minted)?;
        }
        info!(caller, %position, minted = %minted, stake, "position deposited for shares");
        Ok(minted)
    }

    /// Buys a held position out of the vault with shares: burns shares
    /// worth the position's value plus the repayment fee, then releases
    /// custody to the caller.
    pub fn redeem_position_for_shares(
        &mut self,
        caller: &str,
        position: PositionRef,
    ) -> Result<U256, VaultError> {
        self.ensure_active()?;
        self.ensure_held(&position)?;
        let value = self.oracle.value_of_position(&position)?;
        let fee = percent_of(value, self.params.repayment_fee_percent)?;
        let cost = value
            .checked_add(fee)
            .ok_or(VaultError::Overflow { op: "position cost" })?;
        let nav = self.pool_nav()?;
        let supply = self.shares.total_supply();
        let share_cost = usd_to_shares(cost, nav, supply, &self.params)?;
        let held = self.shares.balance_of(caller);
        if held < share_cost {
            return Err(VaultError::InsufficientBalance {
                available: held,
                requested: share_cost,
            });
        }
        self.custody.transfer_position_out(caller, &position)?;
        self.holdings.retain(|held| held != &position);
        self.shares.burn(caller, share_cost)?;
        self.fees.accrue(FeeKind::Repayment, fee)?;
        info!(caller, %position, share_cost = %share_cost, "position redeemed for shares");
        Ok(share_cost)
    }

    /// Deploys `usd` of pooled capital into a new external position in
    /// `pool`. Admin-gated.
    pub fn purchase_position(
        &mut self,
        caller: &str,
        usd: U256,
        pool: &str,
    ) -> Result<PositionRef, VaultError> {
        self.authorize(caller, Action::ManagePositions)?;
        self.ensure_active()?;
        Self::ensure_positive(usd, "purchase amount must be positive")?;
        self.ensure_stable_reserve(usd)?;
        let position = self.custody.purchase_position(usd, pool)?;
        self.stable.burn(VAULT_ADDRESS, usd)?;
        self.holdings.push(position);
        info!(caller, %position, usd = %usd, pool, "position purchased");
        Ok(position)
    }

    /// Liquidates a held position. `min_usd` guards against the oracle
    /// value moving below expectations between quote and execution; the
    /// repayment fee accrues on the realized proceeds.
    pub fn sell_position(
        &mut self,
        caller: &str,
        position: PositionRef,
        min_usd: U256,
    ) -> Result<U256, VaultError> {
        self.authorize(caller, Action::ManagePositions)?;
        self.ensure_active()?;
        self.ensure_held(&position)?;
        let quoted = self.oracle.value_of_position(&position)?;
        if quoted < min_usd {
            return Err(VaultError::ExternalCallFailed(format!(
                "quoted value {quoted} below minimum {min_usd}"
            )));
        }
        let realized = self.custody.sell_position(&position)?;
        self.holdings.retain(|held| held != &position);
        let fee = percent_of(realized, self.params.repayment_fee_percent)?;
        self.stable.mint(VAULT_ADDRESS, realized)?;
        self.fees.accrue(FeeKind::Repayment, fee)?;
        info!(caller, %position, realized = %realized, fee = %fee, "position sold");
        Ok(realized)
    }

    // -----------------------------------------------------------------------
    // Fees, pause, parameters
    // -----------------------------------------------------------------------

    /// Sweeps the entire `kind` bucket to `recipient`. Redemption and
    /// repayment fees pay in stable currency; earning fees pay in the
    /// reward token. Capability-gated, blocked while paused.
    pub fn sweep_fees(
        &mut self,
        caller: &str,
        kind: FeeKind,
        recipient: &str,
    ) -> Result<U256, VaultError> {
        self.authorize(caller, Action::SweepFees)?;
        self.ensure_active()?;
        let amount = self.fees.accrued(kind);
        if amount.is_zero() {
            return Ok(U256::zero());
        }
        match kind {
            FeeKind::Redemption | FeeKind::Repayment => {
                self.ensure_stable_reserve(amount)?;
                self.fees.sweep(kind);
                self.stable.transfer(VAULT_ADDRESS, recipient, amount)?;
            }
            FeeKind::Earning => {
                let held = self.reward.balance_of(VAULT_ADDRESS);
                if held < amount {
                    return Err(VaultError::InsufficientBalance {
                        available: held,
                        requested: amount,
                    });
                }
                self.fees.sweep(kind);
                self.reward.transfer(VAULT_ADDRESS, recipient, amount)?;
            }
        }
        info!(caller, ?kind, recipient, amount = %amount, "fees swept");
        Ok(amount)
    }

    /// Sets the paused flag. Idempotent.
    pub fn pause(&mut self, caller: &str) -> Result<(), VaultError> {
        self.authorize(caller, Action::Pause)?;
        self.paused = true;
        info!(caller, "vault paused");
        Ok(())
    }

    /// Clears the paused flag. Idempotent.
    pub fn unpause(&mut self, caller: &str) -> Result<(), VaultError> {
        self.authorize(caller, Action::Unpause)?;
        self.paused = false;
        info!(caller, "vault unpaused");
        Ok(())
    }

    /// Updates one fee percentage. Capability-gated, `0..=100`.
    pub fn set_fee_percent(
        &mut self,
        caller: &str,
        kind: FeeKind,
        percent: u8,
    ) -> Result<(), VaultError> {
        self.authorize(caller, Action::SetParameters)?;
        if percent > 100 {
            return Err(VaultError::InvalidAmount {
                reason: "fee percent exceeds 100",
            });
        }
        match kind {
            FeeKind::Redemption => self.params.redemption_fee_percent = percent,
            FeeKind::Repayment => self.params.repayment_fee_percent = percent,
            FeeKind::Earning => self.params.earning_fee_percent = percent,
        }
        info!(caller, ?kind, percent, "fee percent updated");
        Ok(())
    }

    /// Updates the reward rate. Every live position is rebased at the
    /// old rate first, so rewards already earned are untouched and the
    /// new rate applies only going forward.
    pub fn set_reward_rate(&mut self, caller: &str, percent: u8) -> Result<(), VaultError> {
        self.authorize(caller, Action::SetParameters)?;
        if percent > 100 {
            return Err(VaultError::InvalidAmount {
                reason: "reward rate percent exceeds 100",
            });
        }
        let now = self.clock.now();
        let holders: Vec<String> = self.stakes.holders().map(str::to_string).collect();
        for holder in &holders {
            self.stakes
                .rebase(holder, self.params.reward_rate_percent, now)?;
        }
        self.params.reward_rate_percent = percent;
        info!(caller, percent, rebased = holders.len(), "reward rate updated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Migration
    // -----------------------------------------------------------------------

    /// Transfers every held position to `to`. Capability-gated and
    /// available while paused. Best effort: every position is attempted,
    /// transferred ones leave the holdings list, and the first custody
    /// failure is reported after the sweep completes.
    pub fn migrate_positions(&mut self, caller: &str, to: &str) -> Result<usize, VaultError> {
        self.authorize(caller, Action::Migrate)?;
        self.ensure_operating()?;
        let mut remaining = Vec::new();
        let mut moved = 0usize;
        let mut failure = None;
        for position in self.holdings.drain(..) {
            match self.custody.transfer_position_out(to, &position) {
                Ok(()) => moved += 1,
                Err(err) => {
                    failure.get_or_insert(err);
                    remaining.push(position);
                }
            }
        }
        self.holdings = remaining;
        info!(caller, to, moved, remaining = self.holdings.len(), "positions migrated");
        match failure {
            Some(err) => Err(err),
            None => Ok(moved),
        }
    }

    /// Transfers the vault's entire stable balance to `to`.
    /// Capability-gated and available while paused.
    pub fn migrate_stable(&mut self, caller: &str, to: &str) -> Result<U256, VaultError> {
        self.authorize(caller, Action::Migrate)?;
        self.ensure_operating()?;
        let amount = self.stable.balance_of(VAULT_ADDRESS);
        self.stable.transfer(VAULT_ADDRESS, to, amount)?;
        info!(caller, to, amount = %amount, "stable migrated");
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    /// The pool's net asset value in stable smallest units: the vault's
    /// stable balance plus the oracle value of every held position.
    /// Recomputed from the live ledgers on each call.
    pub fn pool_nav(&self) -> Result<U256, VaultError> {
        let mut nav = self.stable.balance_of(VAULT_ADDRESS);
        for position in &self.holdings {
            let value = self.oracle.value_of_position(position)?;
            nav = nav
                .checked_add(value)
                .ok_or(VaultError::Overflow { op: "pool NAV" })?;
        }
        Ok(nav)
    }

    /// The reward `holder` could claim right now, pending accrual
    /// included. Non-mutating.
    pub fn redeemable_reward(&self, holder: &str) -> Result<U256, VaultError> {
        self.stakes
            .redeemable(holder, self.params.reward_rate_percent, self.clock.now())
    }

    /// `holder`'s free (unstaked) share balance.
    pub fn share_balance_of(&self, holder: &str) -> U256 {
        self.shares.balance_of(holder)
    }

    /// `holder`'s stable currency balance.
    pub fn stable_balance_of(&self, holder: &str) -> U256 {
        self.stable.balance_of(holder)
    }

    /// `holder`'s reward token balance.
    pub fn reward_balance_of(&self, holder: &str) -> U256 {
        self.reward.balance_of(holder)
    }

    /// `holder`'s staked share principal.
    pub fn staked_amount(&self, holder: &str) -> U256 {
        self.stakes.staked_amount(holder)
    }

    /// Total shares outstanding, staked and free.
    pub fn share_supply(&self) -> U256 {
        self.shares.total_supply()
    }

    /// The unswept balance of a fee bucket.
    pub fn accrued_fees(&self, kind: FeeKind) -> U256 {
        self.fees.accrued(kind)
    }

    /// The positions currently held by the vault.
    pub fn holdings(&self) -> &[PositionRef] {
        &self.holdings
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VaultState {
        self.state
    }

    /// Whether the paused flag is set.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The current parameter set.
    pub fn params(&self) -> &VaultParams {
        &self.params
    }

    // Crate-internal hooks for the incentive pool extension.

    pub(crate) fn burn_reward(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        self.reward.burn(holder, amount)
    }

    pub(crate) fn reward_supply(&self) -> U256 {
        self.reward.total_supply()
    }

    pub(crate) fn total_redeemable_rewards(&self) -> Result<U256, VaultError> {
        self.stakes
            .total_redeemable(self.params.reward_rate_percent, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_engine::auth::SingleAdmin;
    use meridian_engine::clock::ManualClock;
    use meridian_engine::oracle::{StaticCustody, StaticOracle};

    const ADMIN: &str = "mrdn:admin";
    const T0: u64 = 1_700_000_000;

    fn usd(n: u64) -> U256 {
        U256::from(n) * U256::exp10(6)
    }

    fn shares(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    fn build_vault() -> (VaultOperations, Arc<ManualClock>, Arc<StaticOracle>, Arc<StaticCustody>) {
        let clock = Arc::new(ManualClock::new(T0));
        let oracle = Arc::new(StaticOracle::new());
        let custody = Arc::new(StaticCustody::new(VAULT_ADDRESS, Arc::clone(&oracle)));
        let vault = VaultOperations::new(
            VaultParams::default(),
            Arc::clone(&oracle) as Arc<dyn ValuationOracle>,
            Arc::clone(&custody) as Arc<dyn PositionCustody>,
            Arc::new(SingleAdmin::new(ADMIN)),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();
        (vault, clock, oracle, custody)
    }

    fn started_vault() -> (VaultOperations, Arc<ManualClock>, Arc<StaticOracle>, Arc<StaticCustody>) {
        let (mut vault, clock, oracle, custody) = build_vault();
        vault.credit_stable(VAULT_ADDRESS, usd(5)).unwrap();
        vault.start_vault_operation(ADMIN).unwrap();
        (vault, clock, oracle, custody)
    }

    #[test]
    fn bootstrap_mints_rescaled_seed() {
        let (mut vault, _, _, _) = build_vault();
        // 5,000,000 six-decimal units seed 5 * 10^18 share units.
        vault.credit_stable(VAULT_ADDRESS, U256::from(5_000_000u64)).unwrap();
        let minted = vault.start_vault_operation(ADMIN).unwrap();
        assert_eq!(minted, U256::from(5u64) * U256::exp10(18));
        assert_eq!(vault.share_balance_of(VAULT_ADDRESS), minted);
        assert_eq!(vault.state(), VaultState::Operating);
    }

    #[test]
    fn start_requires_capability_and_seed() {
        let (mut vault, _, _, _) = build_vault();
        vault.credit_stable(VAULT_ADDRESS, usd(1)).unwrap();
        assert!(matches!(
            vault.start_vault_operation("mrdn:mallory"),
            Err(VaultError::Unauthorized { .. })
        ));

        let (mut empty, _, _, _) = build_vault();
        assert!(matches!(
            empty.start_vault_operation(ADMIN),
            Err(VaultError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn start_is_one_way_and_once() {
        let (mut vault, _, _, _) = started_vault();
        assert!(matches!(
            vault.start_vault_operation(ADMIN),
            Err(VaultError::AlreadyOperating)
        ));
    }

    #[test]
    fn operations_rejected_before_start() {
        let (mut vault, _, _, _) = build_vault();
        vault.credit_stable("mrdn:alice", usd(10)).unwrap();
        assert!(matches!(
            vault.deposit_stable("mrdn:alice", usd(10)),
            Err(VaultError::NotOperating)
        ));
    }

    #[test]
    fn deposit_prices_against_pre_deposit_nav() {
        let (mut vault, _, _, _) = started_vault();
        vault.credit_stable("mrdn:alice", usd(5)).unwrap();
        // Seed: 5 USD backing 5 shares, price 1.
        let minted = vault.deposit_stable("mrdn:alice", usd(5)).unwrap();
        assert_eq!(minted, shares(5));
        // Pool doubled; a second identical deposit still mints at the
        // pre-deposit price of 1.
        vault.credit_stable("mrdn:bob", usd(10)).unwrap();
        let minted = vault.deposit_stable("mrdn:bob", usd(10)).unwrap();
        assert_eq!(minted, shares(10));
    }

    #[test]
    fn redeem_charges_fee_and_conserves_value() {
        let (mut vault, _, _, _) = started_vault();
        vault.credit_stable("mrdn:alice", usd(100)).unwrap();
        vault.deposit_stable("mrdn:alice", usd(100)).unwrap();

        let net = vault.redeem_shares("mrdn:alice", shares(100)).unwrap();
        assert_eq!(net, usd(99));
        assert_eq!(vault.accrued_fees(FeeKind::Redemption), usd(1));
        assert_eq!(vault.stable_balance_of("mrdn:alice"), usd(99));
        // The fee stays in the pool.
        assert_eq!(vault.stable_balance_of(VAULT_ADDRESS), usd(6));
    }

    #[test]
    fn paused_vault_rejects_value_movers_but_allows_rescue() {
        let (mut vault, _, _, _) = started_vault();
        vault.credit_stable("mrdn:alice", usd(10)).unwrap();
        vault.pause(ADMIN).unwrap();

        assert!(matches!(
            vault.deposit_stable("mrdn:alice", usd(10)),
            Err(VaultError::Paused)
        ));
        assert!(matches!(
            vault.sweep_fees(ADMIN, FeeKind::Redemption, "mrdn:treasury"),
            Err(VaultError::Paused)
        ));

        let rescued = vault.migrate_stable(ADMIN, "mrdn:rescue").unwrap();
        assert_eq!(rescued, usd(5));
        assert_eq!(vault.stable_balance_of("mrdn:rescue"), usd(5));

        vault.unpause(ADMIN).unwrap();
        vault.credit_stable(VAULT_ADDRESS, usd(5)).unwrap();
        vault.deposit_stable("mrdn:alice", usd(10)).unwrap();
    }

    #[test]
    fn custody_failure_leaves_books_untouched() {
        let (mut vault, _, _, custody) = started_vault();
        let position = custody.seed_position("mrdn:alice", usd(3));
        let nav_before = vault.pool_nav().unwrap();

        custody.fail_next();
        assert!(matches!(
            vault.deposit_position("mrdn:alice", position),
            Err(VaultError::ExternalCallFailed(_))
        ));
        assert_eq!(vault.pool_nav().unwrap(), nav_before);
        assert!(vault.holdings().is_empty());
        assert_eq!(vault.accrued_fees(FeeKind::Repayment), U256::zero());
        assert_eq!(vault.stable_balance_of("mrdn:alice"), U256::zero());
    }

    #[test]
    fn purchase_and_sell_round_trip_with_repayment_fee() {
        let (mut vault, _, oracle, _) = started_vault();
        let position = vault.purchase_position(ADMIN, usd(4), "senior").unwrap();
        // Capital deployed: stable down, NAV unchanged.
        assert_eq!(vault.stable_balance_of(VAULT_ADDRESS), usd(1));
        assert_eq!(vault.pool_nav().unwrap(), usd(5));

        // Position appreciates, then is sold.
        oracle.set_value(position, usd(6));
        let realized = vault.sell_position(ADMIN, position, usd(5)).unwrap();
        assert_eq!(realized, usd(6));
        assert_eq!(vault.stable_balance_of(VAULT_ADDRESS), usd(7));
        // 2% of 6 USD.
        assert_eq!(vault.accrued_fees(FeeKind::Repayment), U256::from(120_000u64));
        assert!(vault.holdings().is_empty());
    }

    #[test]
    fn sell_below_minimum_is_rejected_before_custody() {
        let (mut vault, _, oracle, _) = started_vault();
        let position = vault.purchase_position(ADMIN, usd(4), "senior").unwrap();
        oracle.set_value(position, usd(3));
        assert!(matches!(
            vault.sell_position(ADMIN, position, usd(4)),
            Err(VaultError::ExternalCallFailed(_))
        ));
        // Still held and still priced into NAV.
        assert_eq!(vault.holdings().len(), 1);
        assert_eq!(vault.pool_nav().unwrap(), usd(4));
    }

    #[test]
    fn position_purchases_are_admin_gated() {
        let (mut vault, _, _, _) = started_vault();
        assert!(matches!(
            vault.purchase_position("mrdn:alice", usd(1), "senior"),
            Err(VaultError::Unauthorized { .. })
        ));
    }

    #[test]
    fn reward_rate_change_rebases_at_old_rate() {
        let (mut vault, clock, _, _) = started_vault();
        vault.credit_stable("mrdn:alice", usd(100)).unwrap();
        vault.deposit_stable_with_stake("mrdn:alice", usd(100)).unwrap();

        clock.advance(meridian_engine::config::SECONDS_PER_YEAR);
        vault.set_reward_rate(ADMIN, 4).unwrap();
        // Year one earned at 2%, year two at 4%.
        clock.advance(meridian_engine::config::SECONDS_PER_YEAR);
        assert_eq!(
            vault.redeemable_reward("mrdn:alice").unwrap(),
            shares(2) + shares(4)
        );
    }

    #[test]
    fn claim_all_with_nothing_redeemable_returns_zero() {
        let (mut vault, _, _, _) = started_vault();
        assert_eq!(vault.claim_all_rewards("mrdn:alice").unwrap(), U256::zero());
    }
}
