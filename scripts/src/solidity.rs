//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    /// The proxy admin that owns every `TransparentUpgradeableProxy`
    #[sol(rpc)]
    interface IProxyAdmin {
        function getProxyImplementation(address proxy) external view returns (address);
        function upgrade(address proxy, address implementation) external;
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }
}

alloy_sol_types::sol! {
    /// Starts the two-step ownership hand-off of the market factory
    function prepareChangeOwner(address newOwner) external;
}
