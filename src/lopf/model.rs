//! LP assembly on top of `good_lp`, solved with the clarabel backend.

use std::collections::BTreeMap;

use good_lp::solvers::clarabel::clarabel;
use good_lp::{
    Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable, VariableDefinition,
    constraint, variable,
};

use super::constraints::{ExtraConstraint, NominalRef};
use super::solution::{
    GeneratorResult, LineResult, LinkResult, LopfSolution, StorageUnitResult, StoreResult,
};
use super::{Formulation, LopfOptions};
use crate::error::{Error, Result};
use crate::network::{ComponentKind, Network};

/// Relative tolerance for checking constraints between two fixed capacities.
const FIXED_RATIO_RTOL: f64 = 1e-9;

/// Capacity of a component: a constant, or a decision variable when extendable.
#[derive(Debug, Clone, Copy)]
enum Nominal {
    Fixed(f64),
    Extendable(Variable),
}

impl Nominal {
    fn scaled(self, k: f64) -> Expression {
        match self {
            Nominal::Fixed(v) => Expression::from(k * v),
            Nominal::Extendable(var) => k * var,
        }
    }

    fn value(self, solution: &impl Solution) -> f64 {
        match self {
            Nominal::Fixed(v) => v,
            Nominal::Extendable(var) => solution.value(var),
        }
    }
}

/// Applies only the finite bounds; clarabel gets no rows for infinite ones.
fn bounded(lo: f64, hi: f64) -> VariableDefinition {
    let mut def = variable();
    if lo.is_finite() {
        def = def.min(lo);
    }
    if hi.is_finite() {
        def = def.max(hi);
    }
    def
}

struct GeneratorVars {
    nom: Nominal,
    p: Vec<Variable>,
}

struct StorageUnitVars {
    nom: Nominal,
    p_dispatch: Vec<Variable>,
    p_store: Vec<Variable>,
    soc: Vec<Variable>,
    spill: Vec<Variable>,
}

struct LinkVars {
    nom: Nominal,
    p0: Vec<Variable>,
}

struct StoreVars {
    nom: Nominal,
    e: Vec<Variable>,
    p: Vec<Variable>,
}

struct LineVars {
    nom: Nominal,
    p0: Vec<Variable>,
}

struct Vars {
    generators: Vec<GeneratorVars>,
    storage_units: Vec<StorageUnitVars>,
    links: Vec<LinkVars>,
    stores: Vec<StoreVars>,
    lines: Vec<LineVars>,
}

struct Builder<'a> {
    network: &'a Network,
    weights: Vec<f64>,
    vars: ProblemVariables,
    constraints: Vec<Constraint>,
    objective: Expression,
    /// Net injection per bus and snapshot; must sum to zero.
    balance: Vec<Vec<Expression>>,
    attached: Vec<bool>,
    co2: Expression,
}

impl<'a> Builder<'a> {
    fn new(network: &'a Network) -> Self {
        let n_t = network.snapshot_count();
        let n_bus = network.buses.len();
        Self {
            network,
            weights: network.snapshots.iter().map(|s| s.weighting).collect(),
            vars: ProblemVariables::new(),
            constraints: Vec::new(),
            objective: Expression::from(0.0),
            balance: vec![vec![Expression::from(0.0); n_t]; n_bus],
            attached: vec![false; n_bus],
            co2: Expression::from(0.0),
        }
    }

    fn n_t(&self) -> usize {
        self.weights.len()
    }

    fn nominal(
        &mut self,
        extendable: bool,
        fixed: f64,
        min: f64,
        max: f64,
        capital_cost: f64,
    ) -> Nominal {
        if extendable {
            let v = self.vars.add(bounded(min, max));
            self.objective += capital_cost * v;
            Nominal::Extendable(v)
        } else {
            Nominal::Fixed(fixed)
        }
    }

    /// New variable with `lo_pu * nom <= x <= hi_pu * nom`.
    fn limited(&mut self, nom: Nominal, lo_pu: f64, hi_pu: f64) -> Variable {
        match nom {
            Nominal::Fixed(v) => self.vars.add(bounded(lo_pu * v, hi_pu * v)),
            Nominal::Extendable(n) => {
                let x = self.vars.add(variable());
                self.constraints.push(constraint::leq(x, hi_pu * n));
                self.constraints.push(constraint::geq(x, lo_pu * n));
                x
            }
        }
    }

    fn inject(&mut self, bus: usize, t: usize, expr: Expression) {
        self.balance[bus][t] += expr;
        self.attached[bus] = true;
    }

    fn add_loads(&mut self) -> Result<()> {
        let network = self.network;
        for load in &network.loads {
            let bus = network.bus_index(&load.bus)?;
            for t in 0..self.n_t() {
                self.inject(bus, t, Expression::from(-load.p_set[t]));
            }
        }
        Ok(())
    }

    fn add_generators(&mut self) -> Result<Vec<GeneratorVars>> {
        let network = self.network;
        let mut out = Vec::with_capacity(network.generators.len());
        for g in &network.generators {
            let bus = network.bus_index(&g.bus)?;
            let nom = self.nominal(
                g.p_nom_extendable,
                g.p_nom,
                g.p_nom_min,
                g.p_nom_max,
                g.capital_cost,
            );
            let co2_per_mwh = network.co2_intensity(&g.carrier) / g.efficiency;
            let mut p = Vec::with_capacity(self.n_t());
            for t in 0..self.n_t() {
                let x = self.limited(nom, g.p_min_pu, g.p_max_pu_at(t));
                let w = self.weights[t];
                self.objective += (w * g.marginal_cost) * x;
                if co2_per_mwh != 0.0 {
                    self.co2 += (w * co2_per_mwh) * x;
                }
                self.inject(bus, t, Expression::from(x));
                p.push(x);
            }
            out.push(GeneratorVars { nom, p });
        }
        Ok(out)
    }

    fn add_storage_units(&mut self) -> Result<Vec<StorageUnitVars>> {
        let network = self.network;
        let n_t = self.n_t();
        let mut out = Vec::with_capacity(network.storage_units.len());
        for su in &network.storage_units {
            let bus = network.bus_index(&su.bus)?;
            let nom = self.nominal(
                su.p_nom_extendable,
                su.p_nom,
                su.p_nom_min,
                su.p_nom_max,
                su.capital_cost,
            );
            let mut v = StorageUnitVars {
                nom,
                p_dispatch: Vec::with_capacity(n_t),
                p_store: Vec::with_capacity(n_t),
                soc: Vec::with_capacity(n_t),
                spill: Vec::with_capacity(n_t),
            };
            for t in 0..n_t {
                v.p_dispatch.push(self.limited(nom, 0.0, su.p_max_pu));
                v.p_store.push(self.limited(nom, 0.0, -su.p_min_pu));
                v.soc.push(self.limited(nom, 0.0, su.max_hours));
                v.spill.push(self.vars.add(bounded(0.0, su.inflow_at(t))));
            }

            for t in 0..n_t {
                let w = self.weights[t];
                let keep = (1.0 - su.standing_loss).powf(w);
                let previous = if t > 0 {
                    keep * v.soc[t - 1]
                } else if su.cyclic_state_of_charge {
                    keep * v.soc[n_t - 1]
                } else {
                    Expression::from(keep * su.state_of_charge_initial)
                };
                let next = previous + (w * su.efficiency_store) * v.p_store[t]
                    - (w / su.efficiency_dispatch) * v.p_dispatch[t]
                    - w * v.spill[t]
                    + Expression::from(w * su.inflow_at(t));
                self.constraints.push(constraint::eq(v.soc[t], next));
                if let Some(set) = su.state_of_charge_set_at(t) {
                    self.constraints.push(constraint::eq(v.soc[t], set));
                }

                self.objective += (w * su.marginal_cost) * v.p_dispatch[t];
                self.inject(bus, t, v.p_dispatch[t] - v.p_store[t]);
            }

            let co2 = network.co2_intensity(&su.carrier);
            if co2 != 0.0 && !su.cyclic_state_of_charge {
                self.co2 += Expression::from(co2 * su.state_of_charge_initial);
                self.co2 -= co2 * v.soc[n_t - 1];
            }
            out.push(v);
        }
        Ok(out)
    }

    fn add_links(&mut self) -> Result<Vec<LinkVars>> {
        let network = self.network;
        let mut out = Vec::with_capacity(network.links.len());
        for link in &network.links {
            let bus0 = network.bus_index(&link.bus0)?;
            let bus1 = network.bus_index(&link.bus1)?;
            let nom = self.nominal(
                link.p_nom_extendable,
                link.p_nom,
                link.p_nom_min,
                link.p_nom_max,
                link.capital_cost,
            );
            let mut p0 = Vec::with_capacity(self.n_t());
            for t in 0..self.n_t() {
                let x = self.limited(nom, link.p_min_pu, link.p_max_pu);
                self.objective += (self.weights[t] * link.marginal_cost) * x;
                self.inject(bus0, t, -1.0 * x);
                self.inject(bus1, t, link.efficiency * x);
                p0.push(x);
            }
            out.push(LinkVars { nom, p0 });
        }
        Ok(out)
    }

    fn add_stores(&mut self) -> Result<Vec<StoreVars>> {
        let network = self.network;
        let n_t = self.n_t();
        let mut out = Vec::with_capacity(network.stores.len());
        for store in &network.stores {
            let bus = network.bus_index(&store.bus)?;
            let nom = self.nominal(
                store.e_nom_extendable,
                store.e_nom,
                store.e_nom_min,
                store.e_nom_max,
                store.capital_cost,
            );
            let mut v = StoreVars {
                nom,
                e: Vec::with_capacity(n_t),
                p: Vec::with_capacity(n_t),
            };
            for _ in 0..n_t {
                v.e.push(self.limited(nom, store.e_min_pu, store.e_max_pu));
                v.p.push(self.vars.add(variable()));
            }
            for t in 0..n_t {
                let w = self.weights[t];
                let keep = (1.0 - store.standing_loss).powf(w);
                let previous = if t > 0 {
                    keep * v.e[t - 1]
                } else if store.e_cyclic {
                    keep * v.e[n_t - 1]
                } else {
                    Expression::from(keep * store.e_initial)
                };
                self.constraints
                    .push(constraint::eq(v.e[t], previous - w * v.p[t]));
                self.objective += (w * store.marginal_cost) * v.p[t];
                self.inject(bus, t, Expression::from(v.p[t]));
            }

            let co2 = network.co2_intensity(&store.carrier);
            if co2 != 0.0 && !store.e_cyclic {
                self.co2 += Expression::from(co2 * store.e_initial);
                self.co2 -= co2 * v.e[n_t - 1];
            }
            out.push(v);
        }
        Ok(out)
    }

    fn add_lines(&mut self, formulation: Formulation) -> Result<Vec<LineVars>> {
        let network = self.network;
        let mut out = Vec::with_capacity(network.lines.len());
        for line in &network.lines {
            let bus0 = network.bus_index(&line.bus0)?;
            let bus1 = network.bus_index(&line.bus1)?;
            let nom = self.nominal(
                line.s_nom_extendable,
                line.s_nom,
                line.s_nom_min,
                line.s_nom_max,
                line.capital_cost,
            );
            let mut p0 = Vec::with_capacity(self.n_t());
            for t in 0..self.n_t() {
                let f = self.limited(nom, -1.0, 1.0);
                self.inject(bus0, t, -1.0 * f);
                self.inject(bus1, t, Expression::from(f));
                p0.push(f);
            }
            out.push(LineVars { nom, p0 });
        }

        match formulation {
            Formulation::Angles => self.add_angle_constraints(&out)?,
            Formulation::Kirchhoff => self.add_cycle_constraints(&out)?,
        }
        Ok(out)
    }

    fn add_angle_constraints(&mut self, lines: &[LineVars]) -> Result<()> {
        let network = self.network;
        let n_t = self.n_t();
        let mut theta: Vec<Option<Vec<Variable>>> = vec![None; network.buses.len()];
        for sub in network.sub_networks()? {
            if sub.lines.is_empty() {
                continue;
            }
            // slack bus keeps angle zero
            for &bus in sub.buses.iter().skip(1) {
                theta[bus] = Some((0..n_t).map(|_| self.vars.add(variable())).collect());
            }
        }
        let angle = |bus: usize, t: usize, k: f64| -> Expression {
            match &theta[bus] {
                Some(v) => k * v[t],
                None => Expression::from(0.0),
            }
        };
        for (line, vars) in network.lines.iter().zip(lines) {
            let bus0 = network.bus_index(&line.bus0)?;
            let bus1 = network.bus_index(&line.bus1)?;
            let b = 1.0 / line.x;
            for t in 0..n_t {
                let flow = angle(bus0, t, b) - angle(bus1, t, b);
                self.constraints.push(constraint::eq(vars.p0[t], flow));
            }
        }
        Ok(())
    }

    fn add_cycle_constraints(&mut self, lines: &[LineVars]) -> Result<()> {
        let network = self.network;
        for sub in network.sub_networks()? {
            for cycle in sub.cycles(network)? {
                for t in 0..self.n_t() {
                    let mut loop_sum = Expression::from(0.0);
                    for &(l, sign) in &cycle {
                        loop_sum += (sign * network.lines[l].x) * lines[l].p0[t];
                    }
                    self.constraints.push(constraint::eq(loop_sum, 0.0));
                }
            }
        }
        Ok(())
    }

    fn add_bus_balances(&mut self) {
        for (bus, per_t) in self.balance.iter().enumerate() {
            if !self.attached[bus] {
                continue;
            }
            for expr in per_t {
                self.constraints.push(constraint::eq(expr.clone(), 0.0));
            }
        }
    }

    fn nominal_of(&self, vars: &Vars, r: &NominalRef) -> Result<Nominal> {
        let network = self.network;
        let idx = network
            .index_of(r.kind, &r.name)
            .ok_or_else(|| Error::NotFound {
                kind: r.kind,
                name: r.name.clone(),
            })?;
        match r.kind {
            ComponentKind::Generator => Ok(vars.generators[idx].nom),
            ComponentKind::StorageUnit => Ok(vars.storage_units[idx].nom),
            ComponentKind::Link => Ok(vars.links[idx].nom),
            ComponentKind::Store => Ok(vars.stores[idx].nom),
            ComponentKind::Line => Ok(vars.lines[idx].nom),
            kind => Err(Error::InvalidNetwork(format!(
                "{kind} \"{}\" has no nominal capacity",
                r.name
            ))),
        }
    }

    fn add_extra_constraints(&mut self, vars: &Vars, extra: &[ExtraConstraint]) -> Result<()> {
        for c in extra {
            match c {
                ExtraConstraint::NominalRatio { lhs, rhs, ratio } => {
                    let l = self.nominal_of(vars, lhs)?;
                    let r = self.nominal_of(vars, rhs)?;
                    if let (Nominal::Fixed(a), Nominal::Fixed(b)) = (l, r) {
                        let scale = a.abs().max((ratio * b).abs()).max(1.0);
                        if (a - ratio * b).abs() > FIXED_RATIO_RTOL * scale {
                            return Err(Error::InvalidNetwork(format!(
                                "extra constraint {c} cannot hold between fixed capacities"
                            )));
                        }
                        continue;
                    }
                    log::debug!("adding extra constraint {c}");
                    self.constraints
                        .push(constraint::eq(l.scaled(1.0), r.scaled(*ratio)));
                }
            }
        }
        Ok(())
    }
}

/// Builds the LP for `network`, solves it and collects the results.
pub(super) fn build_and_solve(network: &Network, options: &LopfOptions) -> Result<LopfSolution> {
    let mut builder = Builder::new(network);
    builder.add_loads()?;
    let vars = Vars {
        generators: builder.add_generators()?,
        storage_units: builder.add_storage_units()?,
        links: builder.add_links()?,
        stores: builder.add_stores()?,
        lines: builder.add_lines(options.formulation)?,
    };
    builder.add_bus_balances();
    builder.add_extra_constraints(&vars, &options.extra_constraints)?;
    if let Some(limit) = options.co2_limit {
        builder
            .constraints
            .push(constraint::leq(builder.co2.clone(), limit));
    }

    let Builder {
        vars: problem,
        constraints,
        objective,
        ..
    } = builder;
    log::debug!("LOPF model has {} constraints", constraints.len());

    let mut model = problem.minimise(objective).using(clarabel);
    for c in constraints {
        model = model.with(c);
    }
    let solution = model.solve()?;

    Ok(collect(network, &vars, &solution))
}

fn values(solution: &impl Solution, vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|&v| solution.value(v)).collect()
}

fn collect(network: &Network, vars: &Vars, solution: &impl Solution) -> LopfSolution {
    let weights: Vec<f64> = network.snapshots.iter().map(|s| s.weighting).collect();
    let weighted = |series: &[f64], cost: f64| -> f64 {
        series.iter().zip(&weights).map(|(x, w)| x * w * cost).sum()
    };

    let mut capital = 0.0;
    let mut marginal = 0.0;
    let mut co2 = 0.0;

    let mut generators = BTreeMap::new();
    for (g, v) in network.generators.iter().zip(&vars.generators) {
        let p = values(solution, &v.p);
        let p_nom_opt = v.nom.value(solution);
        if g.p_nom_extendable {
            capital += g.capital_cost * p_nom_opt;
        }
        marginal += weighted(&p, g.marginal_cost);
        co2 += weighted(&p, network.co2_intensity(&g.carrier) / g.efficiency);
        generators.insert(g.name.clone(), GeneratorResult { p, p_nom_opt });
    }

    let mut storage_units = BTreeMap::new();
    for (su, v) in network.storage_units.iter().zip(&vars.storage_units) {
        let p_dispatch = values(solution, &v.p_dispatch);
        let p_store = values(solution, &v.p_store);
        let state_of_charge = values(solution, &v.soc);
        let p_nom_opt = v.nom.value(solution);
        if su.p_nom_extendable {
            capital += su.capital_cost * p_nom_opt;
        }
        marginal += weighted(&p_dispatch, su.marginal_cost);
        if !su.cyclic_state_of_charge {
            let last = state_of_charge.last().copied().unwrap_or(0.0);
            co2 += network.co2_intensity(&su.carrier) * (su.state_of_charge_initial - last);
        }
        let p = p_dispatch.iter().zip(&p_store).map(|(d, s)| d - s).collect();
        storage_units.insert(
            su.name.clone(),
            StorageUnitResult {
                p,
                p_dispatch,
                p_store,
                state_of_charge,
                spill: values(solution, &v.spill),
                p_nom_opt,
            },
        );
    }

    let mut links = BTreeMap::new();
    for (link, v) in network.links.iter().zip(&vars.links) {
        let p0 = values(solution, &v.p0);
        let p_nom_opt = v.nom.value(solution);
        if link.p_nom_extendable {
            capital += link.capital_cost * p_nom_opt;
        }
        marginal += weighted(&p0, link.marginal_cost);
        let p1 = p0.iter().map(|p| -link.efficiency * p).collect();
        links.insert(link.name.clone(), LinkResult { p0, p1, p_nom_opt });
    }

    let mut stores = BTreeMap::new();
    for (store, v) in network.stores.iter().zip(&vars.stores) {
        let e = values(solution, &v.e);
        let p = values(solution, &v.p);
        let e_nom_opt = v.nom.value(solution);
        if store.e_nom_extendable {
            capital += store.capital_cost * e_nom_opt;
        }
        marginal += weighted(&p, store.marginal_cost);
        if !store.e_cyclic {
            let last = e.last().copied().unwrap_or(0.0);
            co2 += network.co2_intensity(&store.carrier) * (store.e_initial - last);
        }
        stores.insert(store.name.clone(), StoreResult { e, p, e_nom_opt });
    }

    let mut lines = BTreeMap::new();
    for (line, v) in network.lines.iter().zip(&vars.lines) {
        let s_nom_opt = v.nom.value(solution);
        if line.s_nom_extendable {
            capital += line.capital_cost * s_nom_opt;
        }
        lines.insert(
            line.name.clone(),
            LineResult {
                p0: values(solution, &v.p0),
                s_nom_opt,
            },
        );
    }

    LopfSolution {
        objective: capital + marginal,
        capital_costs: capital,
        marginal_costs: marginal,
        co2_emissions: co2,
        snapshots: network.snapshots.clone(),
        generators,
        storage_units,
        links,
        stores,
        lines,
    }
}
