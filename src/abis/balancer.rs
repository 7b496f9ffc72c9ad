use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IComposableStablePool {
        function getRate() external view returns (uint256);
        function getActualSupply() external view returns (uint256);
        function getPoolId() external view returns (bytes32);
    }

    #[sol(rpc)]
    interface IVault {
        function getPoolTokens(bytes32 poolId) external view returns (address[] tokens, uint256[] balances, uint256 lastChangeBlock);
    }
}
